/// Compact `.cmp` code generation
///
/// Emits the section-delimited compact format from a resolved tree:
/// sections joined by `§`, subsections by `^`. Generation is pure and
/// deterministic; the same tree always produces the same output.

use sha2::{Digest, Sha256};

use melon_parser::ast::{
    Polarity, Primitive, Program, Schema, State, StateBody, Tool, Type,
};

/// Two-letter compression table for the well-known persona traits.
/// Unknown traits fall back to their first two letters, lowercased.
const TRAIT_CODES: &[(&str, &str)] = &[
    ("verbosity", "ve"),
    ("professionalism", "pr"),
    ("formality", "fo"),
    ("creativity", "cr"),
    ("empathy", "em"),
    ("technical_depth", "td"),
    ("cautiousness", "ca"),
    ("thoroughness", "th"),
    ("proactivity", "pa"),
    ("helpfulness", "he"),
    ("patience", "pt"),
    ("accuracy", "ac"),
    ("detail_oriented", "do"),
    ("analytical", "an"),
];

#[derive(Debug, Clone)]
pub struct GenOptions {
    /// Reserved knob, currently a no-op: every level emits the same
    /// fully-compact form.
    pub optimization_level: u8,
    /// Force a checksum even when the program's meta block does not
    /// request one.
    pub checksum: bool,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self {
            optimization_level: 3,
            checksum: false,
        }
    }
}

/// Per-compile output statistics. Lengths count characters, not bytes,
/// since the section delimiter is multi-byte in UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stats {
    pub output_length: usize,
    pub output_tokens: usize,
    pub sections: SectionStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectionStats {
    pub header: usize,
    pub persona: usize,
    pub proc: usize,
    pub tools: usize,
    pub schemas: usize,
}

pub struct CodeGenerator<'a> {
    program: &'a Program,
    options: GenOptions,
    // Set during the nested checksum pass so the inner regeneration never
    // re-enters checksum calculation, even when the meta block asks for
    // one.
    suppress_checksum: bool,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(program: &'a Program, options: GenOptions) -> Self {
        Self {
            program,
            options,
            suppress_checksum: false,
        }
    }

    pub fn generate(&self) -> String {
        let blocks = &self.program.prompt.blocks;
        let mut sections = vec![self.generate_header()];

        if blocks.persona.is_some() {
            sections.push(self.generate_persona());
        }
        sections.push(self.generate_proc());
        if blocks.tools.is_some() {
            sections.push(self.generate_tools());
        }
        if !blocks.schemas.is_empty() {
            sections.push(self.generate_schemas());
        }

        sections.join("§")
    }

    pub fn stats(&self) -> Stats {
        let blocks = &self.program.prompt.blocks;
        let output = self.generate();
        let output_length = output.chars().count();

        Stats {
            output_length,
            output_tokens: output_length.div_ceil(4),
            sections: SectionStats {
                header: self.generate_header().chars().count(),
                persona: blocks
                    .persona
                    .as_ref()
                    .map_or(0, |_| self.generate_persona().chars().count()),
                proc: self.generate_proc().chars().count(),
                tools: blocks
                    .tools
                    .as_ref()
                    .map_or(0, |_| self.generate_tools().chars().count()),
                schemas: if blocks.schemas.is_empty() {
                    0
                } else {
                    self.generate_schemas().chars().count()
                },
            },
        }
    }

    /// `HDR|v:version^m:mode[^c:checksum]`
    fn generate_header(&self) -> String {
        let prompt = &self.program.prompt;
        let mut parts = vec![
            format!("v:{}", compress_version(&prompt.version)),
            format!("m:{}", compress_mode(&prompt.mode)),
        ];

        let meta_wants_checksum = prompt
            .blocks
            .meta
            .as_ref()
            .is_some_and(|meta| meta.directive("checksum"));

        if !self.suppress_checksum && (self.options.checksum || meta_wants_checksum) {
            parts.push(format!("c:{}", self.calculate_checksum()));
        }

        format!("HDR|{}", parts.join("^"))
    }

    /// `PER|AX:axiom^T:ve=4,he=9^EX:+he(if|then)`
    fn generate_persona(&self) -> String {
        let mut parts = Vec::new();
        let Some(persona) = &self.program.prompt.blocks.persona else {
            return String::from("PER|");
        };

        if let Some(axiom) = &persona.axiom {
            parts.push(format!("AX:{}", axiom.text()));
        }

        if !persona.traits.is_empty() {
            let traits: Vec<String> = persona
                .traits
                .iter()
                .map(|(name, value)| format!("{}={}", compress_trait_name(name), quantize(*value)))
                .collect();
            parts.push(format!("T:{}", traits.join(",")));
        }

        for example in &persona.examples {
            let polarity = match example.polarity {
                Polarity::Positive => '+',
                Polarity::Negative => '-',
            };
            parts.push(format!(
                "EX:{}{}({}|{})",
                polarity,
                compress_trait_name(&example.trait_name),
                example.if_content.text(),
                example.then_content.text()
            ));
        }

        format!("PER|{}", parts.join("^"))
    }

    /// `PRC|S0(label)>S1(exec:tool)>S2(format:Schema)`
    fn generate_proc(&self) -> String {
        let states: Vec<String> = self
            .program
            .prompt
            .blocks
            .proc
            .states
            .iter()
            .map(compress_state)
            .collect();
        format!("PRC|{}", states.join(">"))
    }

    /// `TLS|tool(p:t)>rt{purpose:...}^tool2(...)`
    fn generate_tools(&self) -> String {
        let tools: Vec<String> = self
            .program
            .prompt
            .blocks
            .tools
            .as_ref()
            .map(|block| block.tools.iter().map(compress_tool).collect())
            .unwrap_or_default();
        format!("TLS|{}", tools.join("^"))
    }

    /// `SCH|Name{f:t^g:t}^Other{...}`
    fn generate_schemas(&self) -> String {
        let schemas: Vec<String> = self
            .program
            .prompt
            .blocks
            .schemas
            .iter()
            .map(compress_schema)
            .collect();
        format!("SCH|{}", schemas.join("^"))
    }

    /// First 8 hex digits of the sha256 of the output regenerated with
    /// the checksum section itself suppressed.
    fn calculate_checksum(&self) -> String {
        let inner = CodeGenerator {
            program: self.program,
            options: self.options.clone(),
            suppress_checksum: true,
        };
        let digest = Sha256::digest(inner.generate().as_bytes());
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        hex[..8].to_string()
    }
}

fn compress_version(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

fn compress_mode(mode: &str) -> String {
    match mode {
        "strict" => "st".to_string(),
        "permissive" => "pm".to_string(),
        "debug" => "db".to_string(),
        other => other.chars().take(2).collect(),
    }
}

fn compress_trait_name(name: &str) -> String {
    for (full, code) in TRAIT_CODES {
        if *full == name {
            return (*code).to_string();
        }
    }
    name.chars().take(2).collect::<String>().to_lowercase()
}

/// Quantize a trait weight in [0.0, 1.0] to an integer in [0, 10].
fn quantize(value: f64) -> i64 {
    (value * 10.0).round() as i64
}

fn compress_state(state: &State) -> String {
    match &state.body {
        StateBody::Label(label) => format!("S{}({})", state.id, label),
        StateBody::Exec(tool) => format!("S{}(exec:{})", state.id, tool),
        StateBody::Format(schema) => format!("S{}(format:{})", state.id, schema),
    }
}

fn compress_tool(tool: &Tool) -> String {
    let params: Vec<String> = tool
        .parameters
        .iter()
        .map(|p| format!("{}:{}", p.name, compress_type(&p.ty)))
        .collect();

    let props: Vec<String> = tool
        .properties
        .iter()
        .map(|(key, content)| format!("{}:{}", key, content.text()))
        .collect();

    format!(
        "{}({})>{}{{{}}}",
        tool.name,
        params.join(","),
        compress_type(&tool.return_type),
        props.join("|")
    )
}

fn compress_schema(schema: &Schema) -> String {
    let fields: Vec<String> = schema
        .fields
        .iter()
        .map(|f| format!("{}:{}", f.name, compress_type(&f.ty)))
        .collect();
    format!("{}{{{}}}", schema.name, fields.join("^"))
}

fn compress_type(ty: &Type) -> String {
    match ty {
        Type::Primitive(Primitive::String) => "s".to_string(),
        Type::Primitive(Primitive::Int) => "i".to_string(),
        Type::Primitive(Primitive::Float) => "f".to_string(),
        Type::Primitive(Primitive::Bool) => "b".to_string(),
        Type::Primitive(Primitive::Json) => "j".to_string(),
        Type::Array(element) => format!("a({})", compress_type(element)),
        Type::Enum(values) => format!("e({})", values.join(",")),
        Type::SchemaRef(name) => name.clone(),
    }
}
