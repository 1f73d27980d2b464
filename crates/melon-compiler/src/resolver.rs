/// Pointer resolution against imported ontology documents
///
/// Loads each imported JSON document (concurrently, since imports share no
/// state), then walks the three grammar-fixed pointer sites and replaces
/// every `Content::Unresolved` with a `Content::Resolved` in place.
/// Resolution is fail-fast: the first unresolved pointer aborts the walk.

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::debug;

use melon_diagnostics::{CompileError, Result, Span};
use melon_parser::ast::{Content, Import, Program};

pub struct PointerResolver {
    base_dir: PathBuf,
    file: String,
    ontologies: HashMap<String, Value>,
}

impl PointerResolver {
    pub fn new(base_dir: impl Into<PathBuf>, file: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            file: file.into(),
            ontologies: HashMap::new(),
        }
    }

    /// Resolve every pointer in the program. The tree is mutated in place;
    /// on error it is left partially resolved and should be discarded.
    pub async fn resolve(mut self, program: &mut Program) -> Result<()> {
        self.load_ontologies(&program.imports).await?;

        if let Some(persona) = &mut program.prompt.blocks.persona {
            if let Some(axiom) = &mut persona.axiom {
                self.resolve_content(axiom)?;
            }
            for example in &mut persona.examples {
                self.resolve_content(&mut example.if_content)?;
                self.resolve_content(&mut example.then_content)?;
            }
        }

        if let Some(tools) = &mut program.prompt.blocks.tools {
            for tool in &mut tools.tools {
                for content in tool.properties.values_mut() {
                    self.resolve_content(content)?;
                }
            }
        }

        Ok(())
    }

    /// Load all imported ontology files. Loads run concurrently; the first
    /// failure short-circuits, but substitution never starts before every
    /// import has landed.
    async fn load_ontologies(&mut self, imports: &[Import]) -> Result<()> {
        let mut handles = Vec::with_capacity(imports.len());

        for import in imports {
            let full_path = self.base_dir.join(&import.path);
            let name = import.name.clone();
            let label = import.path.clone();
            let location = import.span.in_file(&self.file);

            handles.push((
                import.span,
                tokio::spawn(async move {
                    let raw = tokio::fs::read_to_string(&full_path).await.map_err(|e| {
                        CompileError::pointer(
                            format!("Failed to load ontology file: {}", label),
                            location.clone(),
                        )
                        .with_hint(e.to_string())
                    })?;
                    let doc: Value = serde_json::from_str(&raw).map_err(|e| {
                        CompileError::pointer(
                            format!("Failed to load ontology file: {}", label),
                            location.clone(),
                        )
                        .with_hint(e.to_string())
                    })?;
                    Ok::<(String, Value), CompileError>((name, doc))
                }),
            ));
        }

        for (span, handle) in handles {
            let joined = handle.await.map_err(|e| {
                CompileError::pointer(
                    format!("Ontology load task failed: {}", e),
                    span.in_file(&self.file),
                )
            })?;
            let (name, doc) = joined?;
            self.ontologies.insert(name, doc);
        }

        debug!(ontologies = self.ontologies.len(), "loaded ontology imports");
        Ok(())
    }

    fn resolve_content(&self, content: &mut Content) -> Result<()> {
        let (path, span) = match content {
            Content::Unresolved { path, span } => (path.clone(), *span),
            Content::Resolved { .. } => return Ok(()),
        };

        let value = self.lookup(&path, span)?;
        *content = Content::Resolved {
            value,
            original_path: path,
            span,
        };
        Ok(())
    }

    /// Walk a dotted path into its ontology document and return the string
    /// leaf it addresses.
    fn lookup(&self, path: &str, span: Span) -> Result<String> {
        let mut parts = path.split('.');
        let ontology_name = parts.next().unwrap_or_default();

        let Some(root) = self.ontologies.get(ontology_name) else {
            return Err(CompileError::pointer(
                format!("Unknown ontology: {}", ontology_name),
                span.in_file(&self.file),
            )
            .with_hint(format!(
                "Ontology '{}' was not imported. Check your import statements.",
                ontology_name
            )));
        };

        let mut value = root;
        let mut walked = ontology_name.to_string();

        for part in parts {
            let object = value.as_object();
            match object.and_then(|o| o.get(part)) {
                Some(next) => {
                    value = next;
                    walked.push('.');
                    walked.push_str(part);
                }
                None => {
                    let hint = match object {
                        Some(o) => suggest_alternatives(o, part, &walked),
                        None => format!(
                            "Cannot index into {} at {}",
                            json_type_name(value),
                            walked
                        ),
                    };
                    return Err(CompileError::pointer(
                        format!("Path not found: {}.{}", walked, part),
                        span.in_file(&self.file),
                    )
                    .with_hint(hint));
                }
            }
        }

        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(CompileError::pointer(
                format!("Pointer must reference a string value: {}", path),
                span.in_file(&self.file),
            )
            .with_hint(format!(
                "Found {} instead. Pointers can only reference string values in the ontology.",
                json_type_name(other)
            ))),
        }
    }
}

/// Offer up to three sibling keys whose case-insensitive edit distance to
/// the missing key is at most 2 — first three found in table order, an
/// intentionally simple heuristic.
fn suggest_alternatives(object: &Map<String, Value>, missing: &str, current_path: &str) -> String {
    let needle = missing.to_lowercase();
    let suggestions: Vec<&String> = object
        .keys()
        .filter(|key| edit_distance(&key.to_lowercase(), &needle) <= 2)
        .take(3)
        .collect();

    if !suggestions.is_empty() {
        let lines: Vec<String> = suggestions
            .iter()
            .map(|s| format!("  - {}.{}", current_path, s))
            .collect();
        return format!("Did you mean one of these?\n{}", lines.join("\n"));
    }

    let keys: Vec<&str> = object.keys().take(5).map(String::as_str).collect();
    let more = if object.len() > 5 { ", ..." } else { "" };
    format!(
        "Available keys at {}: {}{}",
        current_path,
        keys.join(", "),
        more
    )
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Levenshtein edit distance between two strings, two-row formulation.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev_row: Vec<usize> = (0..=b_len).collect();
    let mut curr_row: Vec<usize> = vec![0; b_len + 1];

    for (i, a_char) in a.chars().enumerate() {
        curr_row[0] = i + 1;

        for (j, b_char) in b.chars().enumerate() {
            let cost = usize::from(a_char != b_char);
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_len]
}
