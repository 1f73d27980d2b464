/// Abstract syntax tree for Melon programs
///
/// The tree is fully owned: a `Program` owns its whole subtree for the
/// lifetime of one compile invocation and is discarded afterwards. The
/// resolver rewrites `Content::Unresolved` nodes into `Content::Resolved`
/// in place; no other stage mutates the tree.

use indexmap::IndexMap;
use melon_diagnostics::Span;

/// Root node: ordered imports followed by exactly one prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub imports: Vec<Import>,
    pub prompt: Prompt,
}

/// `import <name> from "<path>"` — resolved later against a base directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub name: String,
    pub path: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub name: String,
    pub version: String,
    pub mode: String,
    pub blocks: Blocks,
    pub span: Span,
}

/// Member blocks of a prompt. `proc` is the only mandatory block.
#[derive(Debug, Clone, PartialEq)]
pub struct Blocks {
    pub meta: Option<Meta>,
    pub schemas: Vec<Schema>,
    pub persona: Option<Persona>,
    pub proc: Proc,
    pub tools: Option<Tools>,
}

/// `meta { checksum: true, ... }` — boolean directives.
#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    pub directives: IndexMap<String, bool>,
    pub span: Span,
}

impl Meta {
    pub fn directive(&self, name: &str) -> bool {
        self.directives.get(name).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<Field>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub span: Span,
}

/// Closed type grammar. Schema references are validated only after all
/// schemas are collected, so forward references parse fine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Primitive(Primitive),
    Array(Box<Type>),
    Enum(Vec<String>),
    SchemaRef(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Int,
    Float,
    Bool,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Persona {
    pub axiom: Option<Content>,
    pub traits: IndexMap<String, f64>,
    pub examples: Vec<Example>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub polarity: Polarity,
    pub trait_name: String,
    pub if_content: Content,
    pub then_content: Content,
    pub span: Span,
}

/// External-content indirection. Pointers exist at exactly three
/// grammar-fixed sites: the persona axiom, each example's if/then, and
/// each tool property value. The resolver replaces `Unresolved` with
/// `Resolved` in place, keeping the original path for provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Unresolved {
        path: String,
        span: Span,
    },
    Resolved {
        value: String,
        original_path: String,
        span: Span,
    },
}

impl Content {
    pub fn span(&self) -> Span {
        match self {
            Content::Unresolved { span, .. } | Content::Resolved { span, .. } => *span,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Content::Resolved { .. })
    }

    /// Text rendered into the compiled output. Unresolved content falls
    /// back to its dotted path, which only happens when a caller skips
    /// resolution on purpose.
    pub fn text(&self) -> &str {
        match self {
            Content::Unresolved { path, .. } => path,
            Content::Resolved { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Proc {
    pub states: Vec<State>,
    pub span: Span,
}

/// One proc state. Ids are strictly sequential from 0; the parser rejects
/// anything else before the tree is built.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: u32,
    pub body: StateBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateBody {
    Label(String),
    Exec(String),
    Format(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tools {
    pub tools: Vec<Tool>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Type,
    pub properties: IndexMap<String, Content>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
    pub span: Span,
}
