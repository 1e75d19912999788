//! Emit strict Rust model types plus decode functions for a shape.
//!
//! The generated file is self-contained application code: structs and enums
//! for the data, and `decode_*` functions that compose this crate's
//! combinators. Output is deterministic for a given shape, so generated
//! models can be checked in and diffed.
//!
//! Two refinements are deliberately left to the shape checker rather than
//! the generated model: string patterns (would drag a regex dependency into
//! every consumer) are noted in a comment, while numeric enums are narrowed
//! with a plain slice check.

use std::collections::BTreeSet;

use crate::shape::Shape;

// ------------------------------- Codegen ----------------------------------- //

pub struct Codegen {
    imports: BTreeSet<&'static str>,
    decls: Vec<String>,
    fns: Vec<String>,
    used_names: BTreeSet<String>,
    used_fns: BTreeSet<String>,
    any_helper: Option<String>,
    null_helper: Option<String>,
}

/// What a lowered shape contributes to its surrounding context: the Rust
/// type to store and an expression that evaluates to its decoder.
struct Binding {
    ty: String,
    expr: String,
    note: Option<String>,
}

impl Binding {
    fn new(ty: impl Into<String>, expr: impl Into<String>) -> Self {
        Self { ty: ty.into(), expr: expr.into(), note: None }
    }
}

impl Codegen {
    pub fn new() -> Self {
        Self {
            imports: BTreeSet::new(),
            decls: Vec::new(),
            fns: Vec::new(),
            used_names: BTreeSet::new(),
            used_fns: BTreeSet::new(),
            any_helper: None,
            null_helper: None,
        }
    }

    /// Lower `shape` rooted at `root_type`. An object root's own decode
    /// function is the entry point; any other root gets an entry-point
    /// function named after it, wrapping the composed decoder unless the
    /// lowering already produced a standalone one.
    pub fn emit(&mut self, shape: &Shape, root_type: &str) {
        self.imports.insert("Value");
        self.imports.insert("DecodeError");
        let root_pascal = pascal_ident(root_type);
        if let Shape::Object { nullable: false, .. } = shape {
            self.lower(shape, &root_pascal, "");
            return;
        }
        // Nullable object roots keep the record under a derived name so the
        // entry point below can own the root name.
        let candidate = match shape {
            Shape::Object { .. } => format!("{root_pascal}Record"),
            _ => root_pascal.clone(),
        };
        let target = format!("decode_{}", snake_ident(root_type));
        // Reserve the entry-point name before lowering so no nested claim
        // can take it out from under the wrapper.
        self.used_fns.insert(target.clone());
        let binding = self.lower(shape, &candidate, "");
        // A lowering that produced a standalone root decoder needs no
        // wrapper; rename it to the entry-point name and export it.
        if binding.expr.starts_with("decode_") && !binding.expr.contains('(') {
            self.export_root_fn(&binding.expr, &target);
            return;
        }
        let mut out = String::new();
        if let Some(note) = &binding.note {
            out.push_str(&format!("// {note}\n"));
        }
        out.push_str(&format!(
            "pub fn {target}(value: &Value) -> Result<{}, DecodeError> {{\n    {}(value)\n}}",
            binding.ty, binding.expr,
        ));
        self.fns.push(out);
    }

    fn export_root_fn(&mut self, src: &str, target: &str) {
        let prefix = format!("fn {src}(");
        if let Some(body) = self.fns.iter_mut().find(|body| body.starts_with(prefix.as_str())) {
            *body = body.replacen(&prefix, &format!("pub fn {target}("), 1);
        }
        if self.any_helper.as_deref() == Some(src) {
            self.any_helper = Some(target.to_string());
        }
        if self.null_helper.as_deref() == Some(src) {
            self.null_helper = Some(target.to_string());
        }
    }

    pub fn into_string(self) -> String {
        let mut out = String::new();
        out.push_str("// Generated by json-shape. Edit the schema, not this file.\n\n");
        let imports = self.imports.iter().copied().collect::<Vec<_>>().join(", ");
        out.push_str(&format!("use json_shape::{{{imports}}};\n"));
        for decl in &self.decls {
            out.push('\n');
            out.push_str(decl);
            out.push('\n');
        }
        for body in &self.fns {
            out.push('\n');
            out.push_str(body);
            out.push('\n');
        }
        out
    }

    fn lower(&mut self, shape: &Shape, name_hint: &str, owner: &str) -> Binding {
        let base = match shape {
            Shape::Any {} => {
                let helper = self.ensure_any_helper();
                Binding::new("Value", helper)
            }
            Shape::Null {} => {
                let helper = self.ensure_null_helper();
                Binding::new("()", helper)
            }
            Shape::Boolean { .. } => {
                self.imports.insert("boolean");
                Binding::new("bool", "boolean")
            }
            Shape::Integer { .. } => {
                self.imports.insert("integer");
                Binding::new("i64", "integer")
            }
            Shape::Float { .. } => {
                self.imports.insert("float");
                Binding::new("f64", "float")
            }
            Shape::Bigint { .. } => {
                self.imports.insert("bigint");
                self.imports.insert("BigInt");
                Binding::new("BigInt", "bigint")
            }
            Shape::Number { values: None, .. } => {
                self.imports.insert("number");
                Binding::new("f64", "number")
            }
            Shape::Number { values: Some(values), .. } => {
                self.lower_number_enum(values, name_hint, owner)
            }
            Shape::String { values: Some(values), .. } => {
                self.lower_string_enum(values, name_hint, owner)
            }
            Shape::String { pattern: Some(pattern), .. } => {
                self.imports.insert("string");
                let mut binding = Binding::new("String", "string");
                binding.note =
                    Some(format!("pattern /{pattern}/ is checked by the shape layer, not here"));
                binding
            }
            Shape::String { .. } => {
                self.imports.insert("string");
                Binding::new("String", "string")
            }
            Shape::Array { items, .. } => {
                self.imports.insert("array");
                let item = self.lower(items, &format!("{name_hint}Item"), owner);
                Binding::new(format!("Vec<{}>", item.ty), format!("array({})", item.expr))
            }
            Shape::Object { properties, required, .. } => {
                self.lower_object(properties, required, name_hint, owner)
            }
        };
        if !shape_is_nullable(shape) {
            return base;
        }
        self.imports.insert("nullable");
        Binding {
            ty: format!("Option<{}>", base.ty),
            expr: format!("nullable({})", base.expr),
            note: base.note,
        }
    }

    fn lower_object(
        &mut self,
        properties: &indexmap::IndexMap<String, Shape>,
        required: &[String],
        name_hint: &str,
        owner: &str,
    ) -> Binding {
        self.imports.insert("field");
        let type_name = self.claim_name(name_hint, owner, true);
        let fn_name = snake_ident(&type_name);

        let mut fields = String::new();
        let mut inits = String::new();
        let mut taken = BTreeSet::new();
        for (key, prop) in properties {
            let binding = self.lower(prop, &pascal_ident(key), &type_name);
            let rust_name = unique_field_name(key, &mut taken);
            let is_required = required.iter().any(|name| name == key);
            let (ty, init) = if is_required {
                (binding.ty.clone(), format!("field({key:?}, {})(value)?", binding.expr))
            } else if binding.ty.starts_with("Option<") {
                // optional + nullable collapse into one Option.
                self.imports.insert("optional");
                (
                    binding.ty.clone(),
                    format!("optional(field({key:?}, {}))(value)?.flatten()", binding.expr),
                )
            } else {
                self.imports.insert("optional");
                (
                    format!("Option<{}>", binding.ty),
                    format!("optional(field({key:?}, {}))(value)?", binding.expr),
                )
            };
            if let Some(note) = &binding.note {
                fields.push_str(&format!("    // {note}\n"));
            }
            fields.push_str(&format!("    pub {rust_name}: {ty},\n"));
            inits.push_str(&format!("        {rust_name}: {init},\n"));
        }

        self.decls.push(format!(
            "#[derive(Debug, Clone, PartialEq)]\npub struct {type_name} {{\n{fields}}}"
        ));

        let body = if properties.is_empty() {
            format!(
                "pub fn decode_{fn_name}(value: &Value) -> Result<{type_name}, DecodeError> {{\n    \
                 if !matches!(value, Value::Object(_)) {{\n        \
                 return Err(DecodeError::expected(\"object\", value));\n    }}\n    \
                 Ok({type_name} {{}})\n}}"
            )
        } else {
            format!(
                "pub fn decode_{fn_name}(value: &Value) -> Result<{type_name}, DecodeError> {{\n    \
                 Ok({type_name} {{\n{inits}    }})\n}}"
            )
        };
        self.fns.push(body);
        Binding::new(type_name, format!("decode_{fn_name}"))
    }

    fn lower_string_enum(&mut self, values: &[String], name_hint: &str, owner: &str) -> Binding {
        self.imports.insert("EnumMapping");
        self.imports.insert("enumerator");
        // String enums emit a `*_mapping` fn, not a `decode_*` one, so the
        // claim only has to cover the type name.
        let type_name = self.claim_name(name_hint, owner, false);
        let fn_name = snake_ident(&type_name);

        let mut variants = String::new();
        let mut entries = String::new();
        let mut taken = BTreeSet::new();
        for raw in values {
            let variant = unique_variant_name(raw, &mut taken);
            variants.push_str(&format!("    {variant},\n"));
            entries.push_str(&format!("        .variant({raw:?}, {type_name}::{variant})\n"));
        }

        self.decls.push(format!(
            "#[derive(Debug, Clone, PartialEq)]\npub enum {type_name} {{\n{variants}}}"
        ));
        self.fns.push(format!(
            "fn {fn_name}_mapping() -> EnumMapping<{type_name}> {{\n    EnumMapping::new()\n{entries}}}"
        ));
        Binding::new(type_name, format!("enumerator({fn_name}_mapping())"))
    }

    fn lower_number_enum(&mut self, values: &[f64], name_hint: &str, owner: &str) -> Binding {
        self.imports.insert("number");
        let claimed = self.claim_name(name_hint, owner, true);
        let fn_name = snake_ident(&claimed);
        let literals =
            values.iter().map(|value| format!("{value:?}")).collect::<Vec<_>>().join(", ");
        self.fns.push(format!(
            "fn decode_{fn_name}(value: &Value) -> Result<f64, DecodeError> {{\n    \
             let decoded = number(value)?;\n    \
             if [{literals}].contains(&decoded) {{\n        \
             return Ok(decoded);\n    }}\n    \
             Err(DecodeError::expected_enum(value))\n}}"
        ));
        Binding::new("f64", format!("decode_{fn_name}"))
    }

    fn ensure_any_helper(&mut self) -> String {
        if let Some(name) = &self.any_helper {
            return name.clone();
        }
        let claimed = self.claim_name("Any", "", true);
        let fn_name = format!("decode_{}", snake_ident(&claimed));
        self.fns.push(format!(
            "fn {fn_name}(value: &Value) -> Result<Value, DecodeError> {{\n    \
             Ok(value.clone())\n}}"
        ));
        self.any_helper = Some(fn_name.clone());
        fn_name
    }

    fn ensure_null_helper(&mut self) -> String {
        if let Some(name) = &self.null_helper {
            return name.clone();
        }
        let claimed = self.claim_name("Null", "", true);
        let fn_name = format!("decode_{}", snake_ident(&claimed));
        self.fns.push(format!(
            "fn {fn_name}(value: &Value) -> Result<(), DecodeError> {{\n    \
             match value {{\n        \
             Value::Null => Ok(()),\n        \
             other => Err(DecodeError::expected(\"null\", other)),\n    }}\n}}"
        ));
        self.null_helper = Some(fn_name.clone());
        fn_name
    }

    // First taker keeps the bare name; later claims get the owner prefix,
    // then a numeral. A claim that emits a `decode_*` fn reserves that name
    // too, so type claims and fn items can never shadow each other.
    fn claim_name(&mut self, candidate: &str, owner: &str, with_decoder: bool) -> String {
        let base = if candidate.is_empty() { "X".to_string() } else { candidate.to_string() };
        if self.try_claim(&base, with_decoder) {
            return base;
        }
        if !owner.is_empty() {
            let prefixed = format!("{owner}{base}");
            if self.try_claim(&prefixed, with_decoder) {
                return prefixed;
            }
        }
        let mut counter = 2usize;
        loop {
            let numbered = format!("{base}{counter}");
            if self.try_claim(&numbered, with_decoder) {
                return numbered;
            }
            counter += 1;
        }
    }

    fn try_claim(&mut self, type_name: &str, with_decoder: bool) -> bool {
        if self.used_names.contains(type_name) {
            return false;
        }
        let fn_name = format!("decode_{}", snake_ident(type_name));
        if with_decoder && self.used_fns.contains(&fn_name) {
            return false;
        }
        self.used_names.insert(type_name.to_string());
        if with_decoder {
            self.used_fns.insert(fn_name);
        }
        true
    }
}

impl Default for Codegen {
    fn default() -> Self {
        Self::new()
    }
}

fn shape_is_nullable(shape: &Shape) -> bool {
    match shape {
        Shape::Any {} | Shape::Null {} => false,
        Shape::Boolean { nullable }
        | Shape::Integer { nullable }
        | Shape::Float { nullable }
        | Shape::Bigint { nullable } => *nullable,
        Shape::String { nullable, .. } => *nullable,
        Shape::Number { nullable, .. } => *nullable,
        Shape::Array { nullable, .. } => *nullable,
        Shape::Object { nullable, .. } => *nullable,
    }
}

// ---------------------------- Identifiers ---------------------------------- //

fn pascal_ident(raw: &str) -> String {
    let mut out = String::new();
    for chunk in raw.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = chunk.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.extend(chars);
        }
    }
    if out.is_empty() {
        return "X".to_string();
    }
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, 'N');
    }
    out
}

fn snake_ident(raw: &str) -> String {
    let mut out = String::new();
    let mut prev_lower = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() {
                if prev_lower {
                    out.push('_');
                }
                out.extend(c.to_lowercase());
                prev_lower = false;
            } else {
                out.push(c);
                prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            }
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
            prev_lower = false;
        }
    }
    let trimmed = out.trim_end_matches('_').to_string();
    if trimmed.is_empty() {
        return "x".to_string();
    }
    if trimmed.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return format!("n{trimmed}");
    }
    trimmed
}

fn rust_field_name(raw: &str) -> String {
    let name = snake_ident(raw);
    // `r#` covers most keywords; the path keywords cannot be raw at all.
    match name.as_str() {
        "self" | "super" | "crate" => format!("{name}_"),
        _ if RUST_KEYWORDS.contains(&name.as_str()) => format!("r#{name}"),
        _ => name,
    }
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "try", "type", "unsafe", "use",
    "where", "while",
];

fn unique_field_name(raw: &str, taken: &mut BTreeSet<String>) -> String {
    let base = rust_field_name(raw);
    if taken.insert(base.clone()) {
        return base;
    }
    let mut counter = 2usize;
    loop {
        let numbered = format!("{base}{counter}");
        if taken.insert(numbered.clone()) {
            return numbered;
        }
        counter += 1;
    }
}

fn unique_variant_name(raw: &str, taken: &mut BTreeSet<String>) -> String {
    let base = pascal_ident(raw);
    if taken.insert(base.clone()) {
        return base;
    }
    let mut counter = 2usize;
    loop {
        let numbered = format!("{base}{counter}");
        if taken.insert(numbered.clone()) {
            return numbered;
        }
        counter += 1;
    }
}

// -------------------------------- Tests ------------------------------------ //
