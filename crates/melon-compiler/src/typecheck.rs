/// Type checking and semantic validation
///
/// Validates cross-referential and value-domain invariants over a parsed
/// program. Unlike the parser and resolver, the checker accumulates every
/// diagnostic it finds in one pass instead of aborting on the first.

use std::collections::{HashMap, HashSet};

use melon_diagnostics::{CompileError, Location, Span, Warning};
use melon_parser::ast::*;

/// Outcome of one checker run. Warnings never affect validity.
#[derive(Debug)]
pub struct CheckOutcome {
    pub valid: bool,
    pub errors: Vec<CompileError>,
    pub warnings: Vec<Warning>,
}

pub struct TypeChecker<'a> {
    program: &'a Program,
    file: String,
    schemas: HashMap<&'a str, &'a Schema>,
    tools: HashMap<&'a str, &'a Tool>,
    errors: Vec<CompileError>,
    warnings: Vec<Warning>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(program: &'a Program, file: impl Into<String>) -> Self {
        Self {
            program,
            file: file.into(),
            schemas: HashMap::new(),
            tools: HashMap::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn check(mut self) -> CheckOutcome {
        let blocks = &self.program.prompt.blocks;

        // Collect schemas first so forward references validate. A duplicate
        // name is an error but collection continues; last definition wins
        // for subsequent lookups.
        for schema in &blocks.schemas {
            if self.schemas.contains_key(schema.name.as_str()) {
                self.errors.push(
                    CompileError::type_error(
                        format!("Duplicate schema definition: {}", schema.name),
                        self.loc(schema.span),
                    )
                    .with_hint("Each schema must have a unique name"),
                );
            }
            self.schemas.insert(&schema.name, schema);
        }

        // Tools are collected before proc validation needs them.
        if let Some(tools) = &blocks.tools {
            for tool in &tools.tools {
                if self.tools.contains_key(tool.name.as_str()) {
                    self.errors.push(
                        CompileError::validation(
                            format!("Duplicate tool definition: {}", tool.name),
                            self.loc(tool.span),
                        )
                        .with_hint("Each tool must have a unique name"),
                    );
                }
                self.tools.insert(&tool.name, tool);
            }
        }

        for schema in &blocks.schemas {
            self.validate_schema(schema);
        }

        self.validate_proc(&blocks.proc);

        if let Some(tools) = &blocks.tools {
            self.validate_tools(tools);
        }

        if let Some(persona) = &blocks.persona {
            self.validate_persona(persona);
        }

        CheckOutcome {
            valid: self.errors.is_empty(),
            errors: self.errors,
            warnings: self.warnings,
        }
    }

    fn validate_schema(&mut self, schema: &Schema) {
        let mut field_names = HashSet::new();

        for field in &schema.fields {
            if !field_names.insert(field.name.as_str()) {
                self.errors.push(
                    CompileError::type_error(
                        format!(
                            "Duplicate field name '{}' in schema '{}'",
                            field.name, schema.name
                        ),
                        self.loc(field.span),
                    )
                    .with_hint("Each field in a schema must have a unique name"),
                );
            }

            if !self.is_valid_type(&field.ty) {
                self.errors.push(
                    CompileError::type_error(
                        format!(
                            "Invalid type for field '{}' in schema '{}'",
                            field.name, schema.name
                        ),
                        self.loc(field.span),
                    )
                    .with_hint(
                        "Type must be a primitive, array, enum, or reference to another schema",
                    ),
                );
            }
        }

        if schema.fields.is_empty() {
            self.warnings.push(Warning::new(
                format!("Schema '{}' has no fields", schema.name),
                self.loc(schema.span),
            ));
        }
    }

    fn is_valid_type(&self, ty: &Type) -> bool {
        match ty {
            Type::Primitive(_) => true,
            Type::Array(element) => self.is_valid_type(element),
            Type::Enum(values) => {
                if values.is_empty() {
                    return false;
                }
                let unique: HashSet<&str> = values.iter().map(String::as_str).collect();
                unique.len() == values.len()
            }
            Type::SchemaRef(name) => self.schemas.contains_key(name.as_str()),
        }
    }

    fn validate_proc(&mut self, proc: &Proc) {
        let mut seen = HashSet::new();

        for state in &proc.states {
            // The parser already rejects non-sequential ids, which makes
            // this unreachable in practice; kept to mirror the semantic
            // invariant independently of the grammar.
            if !seen.insert(state.id) {
                self.errors.push(
                    CompileError::validation(
                        format!("Duplicate state ID: S{}", state.id),
                        self.loc(state.span),
                    )
                    .with_hint("Each state must have a unique sequential ID"),
                );
            }

            match &state.body {
                StateBody::Exec(tool) => {
                    if !self.tools.contains_key(tool.as_str()) {
                        self.errors.push(
                            CompileError::validation(
                                format!("Unknown tool reference: {}", tool),
                                self.loc(state.span),
                            )
                            .with_hint(format!(
                                "Tool '{}' must be defined in the tools block",
                                tool
                            )),
                        );
                    }
                }
                StateBody::Format(schema) => {
                    if !self.schemas.contains_key(schema.as_str()) {
                        self.errors.push(
                            CompileError::validation(
                                format!("Unknown schema reference: {}", schema),
                                self.loc(state.span),
                            )
                            .with_hint(format!("Schema '{}' must be defined", schema)),
                        );
                    }
                }
                StateBody::Label(_) => {}
            }
        }

        if let Some(last) = proc.states.last() {
            if !matches!(last.body, StateBody::Format(_)) {
                self.errors.push(
                    CompileError::validation(
                        "Final state must have a format directive",
                        self.loc(last.span),
                    )
                    .with_hint(
                        "The last state in proc must specify an output schema with format: SchemaName",
                    ),
                );
            }
        }
    }

    fn validate_tools(&mut self, tools: &Tools) {
        for tool in &tools.tools {
            let mut param_names = HashSet::new();
            for param in &tool.parameters {
                if !param_names.insert(param.name.as_str()) {
                    self.errors.push(
                        CompileError::type_error(
                            format!(
                                "Duplicate parameter name '{}' in tool '{}'",
                                param.name, tool.name
                            ),
                            self.loc(param.span),
                        )
                        .with_hint("Each parameter in a tool must have a unique name"),
                    );
                }

                if !self.is_valid_type(&param.ty) {
                    self.errors.push(CompileError::type_error(
                        format!(
                            "Invalid type for parameter '{}' in tool '{}'",
                            param.name, tool.name
                        ),
                        self.loc(param.span),
                    ));
                }
            }

            if !self.is_valid_type(&tool.return_type) {
                self.errors.push(CompileError::type_error(
                    format!("Invalid return type for tool '{}'", tool.name),
                    self.loc(tool.span),
                ));
            }

            if !tool.properties.contains_key("purpose") {
                self.warnings.push(Warning::new(
                    format!(
                        "Tool '{}' should have a purpose property for documentation",
                        tool.name
                    ),
                    self.loc(tool.span),
                ));
            }
        }
    }

    fn validate_persona(&mut self, persona: &Persona) {
        for (name, value) in &persona.traits {
            // Boundary values 0 and 1 are valid; NaN is not.
            if !(0.0..=1.0).contains(value) {
                self.errors.push(
                    CompileError::validation(
                        format!("Invalid trait value for '{}': {}", name, value),
                        self.loc(persona.span),
                    )
                    .with_hint("Trait values must be numbers between 0.0 and 1.0"),
                );
            }
        }

        for example in &persona.examples {
            if !persona.traits.contains_key(&example.trait_name) {
                self.errors.push(
                    CompileError::validation(
                        format!("Example references undefined trait: {}", example.trait_name),
                        self.loc(example.span),
                    )
                    .with_hint(format!(
                        "Trait '{}' must be defined in the traits block",
                        example.trait_name
                    )),
                );
            }
        }

        if persona.axiom.is_none() {
            self.warnings.push(Warning::new(
                "Persona should have an axiom defining core identity",
                self.loc(persona.span),
            ));
        }
    }

    fn loc(&self, span: Span) -> Location {
        span.in_file(&self.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use melon_parser::parse_source;

    fn check(source: &str) -> CheckOutcome {
        let program = parse_source(source, "<test>").unwrap();
        TypeChecker::new(&program, "<test>").check()
    }

    #[test]
    fn valid_program_checks_clean() {
        let outcome = check(
            r#"
prompt "agent:v1.0|mode:strict" {
    schema Output {
        response: string,
        confidence: float,
    }
    proc { S0(init) -> S1(format: Output) }
}
"#,
        );
        assert!(outcome.valid, "errors: {:?}", outcome.errors);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn duplicate_schema_and_dangling_tool_reported_in_one_pass() {
        let outcome = check(
            r#"
prompt "a:1|mode:strict" {
    schema Out { r: string, }
    schema Out { r: string, }
    proc { S0(exec: tools.missing) -> S1(format: Out) }
}
"#,
        );
        assert!(!outcome.valid);
        // Both the duplicate and the dangling reference surface, not just
        // the first problem found.
        assert!(outcome
            .errors
            .iter()
            .any(|e| e.message.contains("Duplicate schema definition: Out")));
        assert!(outcome
            .errors
            .iter()
            .any(|e| e.message.contains("Unknown tool reference: missing")));
    }

    #[test]
    fn final_state_must_carry_format() {
        let outcome = check(
            r#"
prompt "a:1|mode:strict" {
    schema Out { r: string, }
    proc { S0(format: Out) -> S1(wrap_up) }
}
"#,
        );
        assert!(!outcome.valid);
        assert!(outcome
            .errors
            .iter()
            .any(|e| e.message.contains("Final state must have a format directive")));
    }

    #[test]
    fn trait_values_out_of_range_are_errors() {
        let outcome = check(
            r#"
prompt "a:1|mode:strict" {
    persona {
        traits {
            eager: 1.5,
            shy: -0.1,
        }
    }
    schema Out { r: string, }
    proc { S0(format: Out) }
}
"#,
        );
        let trait_errors: Vec<_> = outcome
            .errors
            .iter()
            .filter(|e| e.message.contains("Invalid trait value"))
            .collect();
        assert_eq!(trait_errors.len(), 2);
        assert!(trait_errors.iter().any(|e| e.message.contains("'eager': 1.5")));
        assert!(trait_errors.iter().any(|e| e.message.contains("'shy': -0.1")));
    }

    #[test]
    fn boundary_trait_values_pass() {
        let outcome = check(
            r#"
prompt "a:1|mode:strict" {
    persona {
        axiom: ontology.axioms.identity as Pointer,
        traits {
            floor: 0.0,
            ceiling: 1.0,
        }
    }
    schema Out { r: string, }
    proc { S0(format: Out) }
}
"#,
        );
        assert!(outcome.valid, "errors: {:?}", outcome.errors);
    }

    #[test]
    fn example_must_reference_declared_trait() {
        let outcome = check(
            r#"
prompt "a:1|mode:strict" {
    persona {
        axiom: ontology.axioms.identity as Pointer,
        traits { calm: 0.5, }
        example(positive, on: boldness) {
            if: ontology.ex.a as Pointer,
            then: ontology.ex.b as Pointer,
        }
    }
    schema Out { r: string, }
    proc { S0(format: Out) }
}
"#,
        );
        assert!(!outcome.valid);
        assert!(outcome
            .errors
            .iter()
            .any(|e| e.message.contains("Example references undefined trait: boldness")));
    }

    #[test]
    fn forward_schema_references_are_valid() {
        let outcome = check(
            r#"
prompt "a:1|mode:strict" {
    schema First { next: Second, }
    schema Second { r: string, }
    proc { S0(format: First) }
}
"#,
        );
        assert!(outcome.valid, "errors: {:?}", outcome.errors);
    }

    #[test]
    fn unknown_schema_reference_in_field_is_an_error() {
        let outcome = check(
            r#"
prompt "a:1|mode:strict" {
    schema Out { r: Missing, }
    proc { S0(format: Out) }
}
"#,
        );
        assert!(!outcome.valid);
        assert!(outcome
            .errors
            .iter()
            .any(|e| e.message.contains("Invalid type for field 'r' in schema 'Out'")));
    }

    #[test]
    fn enum_with_duplicate_values_is_invalid() {
        let outcome = check(
            r#"
prompt "a:1|mode:strict" {
    schema Out { r: enum(red, red), }
    proc { S0(format: Out) }
}
"#,
        );
        assert!(!outcome.valid);
    }

    #[test]
    fn empty_schema_and_missing_purpose_warn() {
        let outcome = check(
            r#"
prompt "a:1|mode:strict" {
    schema Empty { }
    schema Out { r: string, }
    tools {
        tool search(q: string) -> json {
            behavior: ontology.tools.search.behavior as Pointer,
        }
    }
    proc { S0(format: Out) }
}
"#,
        );
        assert!(outcome.valid);
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.message.contains("Schema 'Empty' has no fields")));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.message.contains("Tool 'search' should have a purpose property")));
    }

    #[test]
    fn persona_without_axiom_warns() {
        let outcome = check(
            r#"
prompt "a:1|mode:strict" {
    persona {
        traits { calm: 0.5, }
    }
    schema Out { r: string, }
    proc { S0(format: Out) }
}
"#,
        );
        assert!(outcome.valid);
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.message.contains("Persona should have an axiom")));
    }

    #[test]
    fn duplicate_parameter_names_are_errors() {
        let outcome = check(
            r#"
prompt "a:1|mode:strict" {
    schema Out { r: string, }
    tools {
        tool search(q: string, q: int) -> json {
            purpose: ontology.tools.search.purpose as Pointer,
        }
    }
    proc { S0(format: Out) }
}
"#,
        );
        assert!(!outcome.valid);
        assert!(outcome
            .errors
            .iter()
            .any(|e| e.message.contains("Duplicate parameter name 'q' in tool 'search'")));
    }
}
