//! Minimal CLI: check documents against a shape, or emit a Rust model for it.
//!
//! `check` compiles the schema once, loads every input document (with
//! optional NDJSON splitting, JSON Pointer selection, and jq preprocessing),
//! decodes them in parallel, and prints one PASS/FAIL line per document.
//! `rust` emits the generated model for the same schema.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::codegen::Codegen;
use crate::error::DecodeError;
use crate::shape::{self, Decoded, Shape};
use crate::value::Value;

// ------------------------------- Types ------------------------------------- //

/// check JSON/NDJSON documents against a shape schema, or emit a strict Rust model from it
#[derive(Parser, Debug)]
#[command(name = "json-shape", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// decode every input document against the schema and report PASS/FAIL
    Check(CheckTarget),
    /// emit a strict Rust data model plus decode functions for the schema
    Rust(RustTarget),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every filter output becomes one document
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug)]
struct CheckTarget {
    #[command(flatten)]
    input_settings: InputSettings,

    /// shape schema file (JSON)
    #[arg(long)]
    schema: PathBuf,

    /// print the decoded tree of each passing document
    #[arg(long)]
    emit: bool,

    /// write a JSON report to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// disable colored output
    #[arg(long)]
    no_color: bool,
}

#[derive(Args, Debug)]
struct RustTarget {
    /// shape schema file (JSON)
    #[arg(long)]
    schema: PathBuf,

    /// top-level Rust type name
    #[arg(long, default_value = "Root")]
    root_type: String,

    /// output .rs file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One document to check: where it came from, and its (possibly
/// pointer-selected and jq-rewritten) value tree.
#[derive(Debug)]
struct Document {
    origin: String,
    value: Value,
}

struct Outcome {
    origin: String,
    result: Result<Decoded, DecodeError>,
}

// ---------------------------- Implementation -------------------------------- //

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Check(target) => target.run(),
            Command::Rust(target) => target.run(),
        }
    }
}

impl CheckTarget {
    fn run(&self) -> Result<ExitCode> {
        if self.no_color {
            colored::control::set_override(false);
        }
        let decoder = load_decoder(&self.schema)?;
        let documents = self.input_settings.load_documents()?;

        // The compiled decoder is shared by reference across the pool.
        let outcomes = documents
            .into_par_iter()
            .map(|doc| Outcome { origin: doc.origin, result: decoder(&doc.value) })
            .collect::<Vec<_>>();

        let mut failed = 0usize;
        for outcome in &outcomes {
            match &outcome.result {
                Ok(decoded) => {
                    println!("{} {}", "PASS".green().bold(), outcome.origin);
                    if self.emit {
                        let rendered = serde_json::to_string_pretty(&decoded.to_json())
                            .context("rendering decoded tree")?;
                        println!("{rendered}");
                    }
                }
                Err(err) => {
                    failed += 1;
                    println!("{} {}", "FAIL".red().bold(), outcome.origin);
                    for line in err.to_string().lines() {
                        println!("    {line}");
                    }
                    let path = err.path();
                    if !path.is_empty() {
                        println!("    path: {path}");
                    }
                }
            }
        }

        if let Some(report_path) = self.report.as_ref() {
            write_report(report_path, &self.schema, &outcomes)?;
        }

        eprintln!("{} checked, {} failed", outcomes.len(), failed);
        if failed == 0 {
            Ok(ExitCode::SUCCESS)
        } else {
            Ok(ExitCode::FAILURE)
        }
    }
}

impl RustTarget {
    fn run(&self) -> Result<ExitCode> {
        let shape = load_shape(&self.schema)?;
        // Surface shape-level mistakes (bad pattern, empty enum) before
        // emitting anything.
        let _ = shape::to_decoder(&shape)
            .with_context(|| format!("compiling schema {}", self.schema.display()))?;
        let mut cg = Codegen::new();
        cg.emit(&shape, &self.root_type);
        let rust_src = cg.into_string();

        if let Some(out) = self.out.as_ref() {
            if let Some(parent) = out.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
            }
            std::fs::write(out, &rust_src)
                .with_context(|| format!("writing {}", out.display()))?;
        } else {
            println!("{rust_src}");
        }
        Ok(ExitCode::SUCCESS)
    }
}

fn load_shape(path: &Path) -> Result<Shape> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading schema {}", path.display()))?;
    let shape = crate::path_de::from_str_with_path::<Shape>(&source)
        .with_context(|| format!("parsing schema {}", path.display()))?;
    Ok(shape)
}

fn load_decoder(path: &Path) -> Result<crate::decode::BoxDecoder<Decoded>> {
    let shape = load_shape(path)?;
    let decoder = shape::to_decoder(&shape)
        .with_context(|| format!("compiling schema {}", path.display()))?;
    Ok(decoder)
}

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let origin = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("reading {origin}"))?;
            if self.ndjson {
                for (line_no, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let parsed = serde_json::from_str::<serde_json::Value>(line)
                        .with_context(|| format!("parsing {origin}:{}", line_no + 1))?;
                    self.expand(parsed, format!("{origin}:{}", line_no + 1), &mut documents)?;
                }
            } else {
                let parsed = serde_json::from_str::<serde_json::Value>(&source)
                    .with_context(|| format!("parsing {origin}"))?;
                self.expand(parsed, origin, &mut documents)?;
            }
        }
        Ok(documents)
    }

    /// Pointer selection first, then the jq filter; each jq output becomes
    /// its own document.
    fn expand(
        &self,
        parsed: serde_json::Value,
        origin: String,
        documents: &mut Vec<Document>,
    ) -> Result<()> {
        let selected = match self.json_pointer.as_ref() {
            None => parsed,
            Some(pointer) => match parsed.pointer(pointer) {
                Some(subnode) => subnode.clone(),
                None => bail!("json pointer {pointer} selects nothing in {origin}"),
            },
        };
        match self.jq_expr.as_ref() {
            None => {
                documents.push(Document { origin, value: Value::from(selected) });
            }
            Some(jq_expr) => {
                let outputs = crate::jq_exec::run_filter(jq_expr, &selected)
                    .with_context(|| format!("applying jq filter to {origin}"))?;
                let solo = outputs.len() == 1;
                for (index, output) in outputs.into_iter().enumerate() {
                    let origin =
                        if solo { origin.clone() } else { format!("{origin}#{index}") };
                    documents.push(Document { origin, value: Value::from(output) });
                }
            }
        }
        Ok(())
    }
}

fn write_report(report_path: &Path, schema: &Path, outcomes: &[Outcome]) -> Result<()> {
    let failed = outcomes.iter().filter(|outcome| outcome.result.is_err()).count();
    let results = outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(_) => serde_json::json!({ "origin": outcome.origin, "ok": true }),
            Err(err) => serde_json::json!({
                "origin": outcome.origin,
                "ok": false,
                "error": err.to_string(),
                "path": err.path(),
            }),
        })
        .collect::<Vec<_>>();
    let report = serde_json::json!({
        "schema": schema.to_string_lossy(),
        "checked_at": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        "total": outcomes.len(),
        "passed": outcomes.len() - failed,
        "failed": failed,
        "results": results,
    });
    let rendered = serde_json::to_string_pretty(&report).context("rendering report")?;
    if let Some(parent) = report_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    std::fs::write(report_path, rendered)
        .with_context(|| format!("writing report {}", report_path.display()))?;
    Ok(())
}

// --------------------------- Internal helpers ------------------------------- //

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in
                glob::glob(pattern).with_context(|| format!("bad glob pattern {pattern}"))?
            {
                let path =
                    entry.with_context(|| format!("walking glob pattern {pattern}"))?;
                matched_any = true;
                out.push(path);
            }
            if !matched_any {
                // Explicitly a glob yet matched nothing: surface as an error.
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// -------------------------------- Tests ------------------------------------ //
