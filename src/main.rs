use std::process::ExitCode;

fn main() -> ExitCode {
    let command_line_interface = json_shape::cli::CommandLineInterface::load();
    match command_line_interface.run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
