/// Recursive-descent parser for the Melon language
///
/// Single pass over the token stream with one-token lookahead and no
/// backtracking. Parsing is fail-fast: the first error aborts and no
/// partial tree is returned.

pub mod ast;

pub use ast::*;

use indexmap::IndexMap;
use melon_diagnostics::{CompileError, Result, Span};
use melon_lexer::{Token, TokenKind};

/// Parse a token stream into a program, labeling diagnostics with `file`.
pub fn parse(tokens: Vec<Token>, file: &str) -> Result<Program> {
    Parser::new(tokens, file).parse()
}

/// Convenience for tests and tools: lex and parse in one call.
pub fn parse_source(source: &str, file: &str) -> Result<Program> {
    let tokens = melon_lexer::tokenize(source, file)?;
    parse(tokens, file)
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    file: String,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, file: impl Into<String>) -> Self {
        Self {
            tokens,
            current: 0,
            file: file.into(),
        }
    }

    pub fn parse(mut self) -> Result<Program> {
        let imports = self.parse_imports()?;
        let prompt = self.parse_prompt()?;
        Ok(Program { imports, prompt })
    }

    fn parse_imports(&mut self) -> Result<Vec<Import>> {
        let mut imports = Vec::new();
        while self.match_kind(TokenKind::Import) {
            imports.push(self.parse_import()?);
        }
        Ok(imports)
    }

    /// `import ontology from "./path.json"`
    fn parse_import(&mut self) -> Result<Import> {
        let span = self.previous().span;
        let name = self
            .consume(TokenKind::Identifier, "Expected import name")?
            .text
            .clone();
        self.consume(TokenKind::From, "Expected \"from\"")?;
        let path = self
            .consume(TokenKind::StringLiteral, "Expected path string")?
            .text
            .clone();
        Ok(Import { name, path, span })
    }

    fn parse_prompt(&mut self) -> Result<Prompt> {
        let span = self.consume(TokenKind::Prompt, "Expected \"prompt\"")?.span;
        let header_str = self
            .consume(TokenKind::StringLiteral, "Expected prompt header")?
            .text
            .clone();
        let (name, version, mode) = self.parse_prompt_header(&header_str)?;

        self.consume(TokenKind::LBrace, "Expected \"{\"")?;

        let mut meta = None;
        let mut schemas = Vec::new();
        let mut persona = None;
        let mut proc = None;
        let mut tools = None;

        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if self.match_kind(TokenKind::Meta) {
                meta = Some(self.parse_meta_block()?);
            } else if self.match_kind(TokenKind::Schema) {
                schemas.push(self.parse_schema_block()?);
            } else if self.match_kind(TokenKind::Persona) {
                persona = Some(self.parse_persona_block()?);
            } else if self.match_kind(TokenKind::Proc) {
                proc = Some(self.parse_proc_block()?);
            } else if self.match_kind(TokenKind::Tools) {
                tools = Some(self.parse_tools_block()?);
            } else {
                return Err(self.error("Unexpected token in prompt body"));
            }
        }

        self.consume(TokenKind::RBrace, "Expected \"}\"")?;

        // The proc block is mandatory at the grammar level.
        let Some(proc) = proc else {
            return Err(self.error("Prompt must contain a proc block"));
        };

        Ok(Prompt {
            name,
            version,
            mode,
            blocks: Blocks {
                meta,
                schemas,
                persona,
                proc,
                tools,
            },
            span,
        })
    }

    /// Header sub-grammar: `"name:version|mode:value"`.
    fn parse_prompt_header(&mut self, header: &str) -> Result<(String, String, String)> {
        let parts: Vec<&str> = header.split('|').collect();
        if parts.len() != 2 {
            return Err(
                self.error("Invalid prompt header format. Expected \"name:version|mode:value\"")
            );
        }

        let nv: Vec<&str> = parts[0].split(':').collect();
        if nv.len() != 2 {
            return Err(self.error("Invalid name:version format"));
        }

        let mv: Vec<&str> = parts[1].split(':').collect();
        if mv.len() != 2 || mv[0] != "mode" {
            return Err(self.error("Invalid mode format. Expected \"mode:value\""));
        }

        Ok((nv[0].to_string(), nv[1].to_string(), mv[1].to_string()))
    }

    fn parse_meta_block(&mut self) -> Result<Meta> {
        let span = self.previous().span;
        self.consume(TokenKind::LBrace, "Expected \"{\"")?;

        let mut directives = IndexMap::new();

        while !self.check(TokenKind::RBrace) {
            // Directive names may be identifiers or the reserved
            // checksum/confidence_token keywords.
            let name = if self.check(TokenKind::Identifier)
                || self.check(TokenKind::Checksum)
                || self.check(TokenKind::ConfidenceToken)
            {
                self.advance().text.clone()
            } else {
                return Err(self.error("Expected directive name"));
            };

            self.consume(TokenKind::Colon, "Expected \":\"")?;

            let value = if self.match_kind(TokenKind::True) {
                true
            } else if self.match_kind(TokenKind::False) {
                false
            } else {
                return Err(self.error("Expected true or false"));
            };
            directives.insert(name, value);

            self.consume(TokenKind::Comma, "Expected \",\"")?;
        }

        self.consume(TokenKind::RBrace, "Expected \"}\"")?;
        Ok(Meta { directives, span })
    }

    fn parse_schema_block(&mut self) -> Result<Schema> {
        let span = self.previous().span;
        let name = self
            .consume(TokenKind::Identifier, "Expected schema name")?
            .text
            .clone();
        self.consume(TokenKind::LBrace, "Expected \"{\"")?;

        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let field_span = self.peek().span;
            let field_name = self
                .consume(TokenKind::Identifier, "Expected field name")?
                .text
                .clone();
            self.consume(TokenKind::Colon, "Expected \":\"")?;
            let ty = self.parse_type()?;
            self.consume(TokenKind::Comma, "Expected \",\"")?;

            fields.push(Field {
                name: field_name,
                ty,
                span: field_span,
            });
        }

        self.consume(TokenKind::RBrace, "Expected \"}\"")?;
        Ok(Schema { name, fields, span })
    }

    fn parse_type(&mut self) -> Result<Type> {
        if self.match_kind(TokenKind::String) {
            return Ok(Type::Primitive(Primitive::String));
        }
        if self.match_kind(TokenKind::Int) {
            return Ok(Type::Primitive(Primitive::Int));
        }
        if self.match_kind(TokenKind::Float) {
            return Ok(Type::Primitive(Primitive::Float));
        }
        if self.match_kind(TokenKind::Bool) {
            return Ok(Type::Primitive(Primitive::Bool));
        }
        if self.match_kind(TokenKind::Json) {
            return Ok(Type::Primitive(Primitive::Json));
        }

        if self.match_kind(TokenKind::Array) {
            self.consume(TokenKind::LParen, "Expected \"(\"")?;
            let element = self.parse_type()?;
            self.consume(TokenKind::RParen, "Expected \")\"")?;
            return Ok(Type::Array(Box::new(element)));
        }

        if self.match_kind(TokenKind::Enum) {
            self.consume(TokenKind::LParen, "Expected \"(\"")?;
            let mut values = Vec::new();
            loop {
                let value = self
                    .consume(TokenKind::Identifier, "Expected enum value")?
                    .text
                    .clone();
                values.push(value);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
            self.consume(TokenKind::RParen, "Expected \")\"")?;
            return Ok(Type::Enum(values));
        }

        // Bare identifier: schema reference, validated after collection.
        if self.check(TokenKind::Identifier) {
            let name = self.advance().text.clone();
            return Ok(Type::SchemaRef(name));
        }

        Err(self.error("Expected type"))
    }

    fn parse_persona_block(&mut self) -> Result<Persona> {
        let span = self.previous().span;
        self.consume(TokenKind::LBrace, "Expected \"{\"")?;

        let mut axiom = None;
        let mut traits = IndexMap::new();
        let mut examples = Vec::new();

        while !self.check(TokenKind::RBrace) {
            if self.match_kind(TokenKind::Axiom) {
                self.consume(TokenKind::Colon, "Expected \":\"")?;
                axiom = Some(self.parse_pointer()?);
                self.consume(TokenKind::Comma, "Expected \",\"")?;
            } else if self.match_kind(TokenKind::Traits) {
                self.consume(TokenKind::LBrace, "Expected \"{\"")?;
                while !self.check(TokenKind::RBrace) {
                    let trait_name = self
                        .consume(TokenKind::Identifier, "Expected trait name")?
                        .text
                        .clone();
                    self.consume(TokenKind::Colon, "Expected \":\"")?;
                    let number = self
                        .consume(TokenKind::NumberLiteral, "Expected number")?
                        .text
                        .clone();
                    let value: f64 = number
                        .parse()
                        .map_err(|_| self.error("Expected number"))?;
                    traits.insert(trait_name, value);
                    self.consume(TokenKind::Comma, "Expected \",\"")?;
                }
                self.consume(TokenKind::RBrace, "Expected \"}\"")?;
            } else if self.match_kind(TokenKind::Example) {
                examples.push(self.parse_example()?);
            } else {
                return Err(self.error("Unexpected token in persona block"));
            }
        }

        self.consume(TokenKind::RBrace, "Expected \"}\"")?;
        Ok(Persona {
            axiom,
            traits,
            examples,
            span,
        })
    }

    /// `example(positive, on: trait) { if: <ptr>, then: <ptr>, }`
    fn parse_example(&mut self) -> Result<Example> {
        let span = self.previous().span;
        self.consume(TokenKind::LParen, "Expected \"(\"")?;

        let polarity = if self.match_kind(TokenKind::Positive) {
            Polarity::Positive
        } else if self.match_kind(TokenKind::Negative) {
            Polarity::Negative
        } else {
            return Err(self.error("Expected \"positive\" or \"negative\""));
        };

        self.consume(TokenKind::Comma, "Expected \",\"")?;
        self.consume(TokenKind::On, "Expected \"on\"")?;
        self.consume(TokenKind::Colon, "Expected \":\"")?;

        let trait_name = self
            .consume(TokenKind::Identifier, "Expected trait name")?
            .text
            .clone();
        self.consume(TokenKind::RParen, "Expected \")\"")?;
        self.consume(TokenKind::LBrace, "Expected \"{\"")?;

        self.consume_label("if")?;
        self.consume(TokenKind::Colon, "Expected \":\"")?;
        let if_content = self.parse_pointer()?;
        self.consume(TokenKind::Comma, "Expected \",\"")?;

        self.consume_label("then")?;
        self.consume(TokenKind::Colon, "Expected \":\"")?;
        let then_content = self.parse_pointer()?;
        self.consume(TokenKind::Comma, "Expected \",\"")?;

        self.consume(TokenKind::RBrace, "Expected \"}\"")?;

        Ok(Example {
            polarity,
            trait_name,
            if_content,
            then_content,
            span,
        })
    }

    /// Pointer expression: `ontology.path.to.value as Pointer`.
    ///
    /// Path segments after the first may be keyword tokens (`tools`,
    /// `axiom`, ...) since ontology keys are free-form JSON.
    fn parse_pointer(&mut self) -> Result<Content> {
        let span = self.peek().span;

        let mut path = self
            .consume(TokenKind::Identifier, "Expected pointer path")?
            .text
            .clone();

        while self.match_kind(TokenKind::Dot) {
            path.push('.');
            if self.check(TokenKind::Identifier) {
                path.push_str(&self.advance().text);
            } else if self.peek().kind.is_keyword() {
                let segment = self.advance().text.to_lowercase();
                path.push_str(&segment);
            } else {
                return Err(self.error("Expected pointer path segment"));
            }
        }

        self.consume(TokenKind::As, "Expected \"as\"")?;
        self.consume(TokenKind::Pointer, "Expected \"Pointer\"")?;

        Ok(Content::Unresolved { path, span })
    }

    fn parse_proc_block(&mut self) -> Result<Proc> {
        let span = self.previous().span;
        self.consume(TokenKind::LBrace, "Expected \"{\"")?;

        let mut states = Vec::new();
        let mut state_id = 0;

        states.push(self.parse_state(state_id)?);
        state_id += 1;

        while self.match_kind(TokenKind::Arrow) {
            states.push(self.parse_state(state_id)?);
            state_id += 1;
        }

        self.consume(TokenKind::RBrace, "Expected \"}\"")?;
        Ok(Proc { states, span })
    }

    /// `S0(label)`, `S1(exec: tools.name)` or `S2(format: Schema)`.
    /// State ids must run sequentially from 0.
    fn parse_state(&mut self, expected_id: u32) -> Result<State> {
        let span = self.peek().span;

        let id_token = self
            .consume(TokenKind::Identifier, "Expected state identifier")?
            .text
            .clone();
        let parsed_id = id_token
            .strip_prefix('S')
            .and_then(|rest| rest.parse::<u32>().ok());
        if parsed_id != Some(expected_id) {
            return Err(self.error(format!("Expected state S{}, got {}", expected_id, id_token)));
        }

        self.consume(TokenKind::LParen, "Expected \"(\"")?;

        let body = if self.check(TokenKind::Identifier) {
            let first = self.peek().text.clone();
            if first == "exec" {
                self.advance();
                self.consume(TokenKind::Colon, "Expected \":\"")?;
                // `tools` lexes as a keyword, but accept an identifier
                // spelling too.
                if self.check(TokenKind::Tools) {
                    self.advance();
                } else {
                    let token = self.consume(TokenKind::Identifier, "Expected \"tools\"")?;
                    if token.text != "tools" {
                        return Err(self.error("Expected \"tools\""));
                    }
                }
                self.consume(TokenKind::Dot, "Expected \".\"")?;
                let tool = self
                    .consume(TokenKind::Identifier, "Expected tool name")?
                    .text
                    .clone();
                StateBody::Exec(tool)
            } else if first == "format" {
                self.advance();
                self.consume(TokenKind::Colon, "Expected \":\"")?;
                let schema = self
                    .consume(TokenKind::Identifier, "Expected schema name")?
                    .text
                    .clone();
                StateBody::Format(schema)
            } else {
                StateBody::Label(self.advance().text.clone())
            }
        } else {
            return Err(self.error("Expected state body"));
        };

        self.consume(TokenKind::RParen, "Expected \")\"")?;

        Ok(State {
            id: expected_id,
            body,
            span,
        })
    }

    fn parse_tools_block(&mut self) -> Result<Tools> {
        let span = self.previous().span;
        self.consume(TokenKind::LBrace, "Expected \"{\"")?;

        let mut tools = Vec::new();
        while !self.check(TokenKind::RBrace) {
            tools.push(self.parse_tool()?);
        }

        self.consume(TokenKind::RBrace, "Expected \"}\"")?;
        Ok(Tools { tools, span })
    }

    /// `tool name(p: type, ...) -> type { prop: <ptr>, ... }`
    fn parse_tool(&mut self) -> Result<Tool> {
        let span = self.consume(TokenKind::Tool, "Expected \"tool\"")?.span;
        let name = self
            .consume(TokenKind::Identifier, "Expected tool name")?
            .text
            .clone();

        self.consume(TokenKind::LParen, "Expected \"(\"")?;
        let mut parameters = Vec::new();

        if !self.check(TokenKind::RParen) {
            loop {
                let param_span = self.peek().span;
                let param_name = self
                    .consume(TokenKind::Identifier, "Expected parameter name")?
                    .text
                    .clone();
                self.consume(TokenKind::Colon, "Expected \":\"")?;
                let ty = self.parse_type()?;
                parameters.push(Parameter {
                    name: param_name,
                    ty,
                    span: param_span,
                });
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenKind::RParen, "Expected \")\"")?;
        self.consume(TokenKind::Arrow, "Expected \"->\"")?;

        let return_type = self.parse_type()?;

        self.consume(TokenKind::LBrace, "Expected \"{\"")?;
        let mut properties = IndexMap::new();

        while !self.check(TokenKind::RBrace) {
            let prop_name = self
                .consume(TokenKind::Identifier, "Expected property name")?
                .text
                .clone();
            self.consume(TokenKind::Colon, "Expected \":\"")?;
            let pointer = self.parse_pointer()?;
            properties.insert(prop_name, pointer);
            self.consume(TokenKind::Comma, "Expected \",\"")?;
        }

        self.consume(TokenKind::RBrace, "Expected \"}\"")?;

        Ok(Tool {
            name,
            parameters,
            return_type,
            properties,
            span,
        })
    }

    // Token stream helpers

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(message))
        }
    }

    /// Consume an identifier with an exact spelling (`if` / `then`).
    fn consume_label(&mut self, expected: &str) -> Result<()> {
        let token = self.consume(TokenKind::Identifier, &format!("Expected \"{}\"", expected))?;
        if token.text != expected {
            return Err(self.error(format!("Expected \"{}\"", expected)));
        }
        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        let token = self.peek();
        CompileError::syntax(message, self.location_of(token.span))
            .with_hint(format!("Got {}", token.kind))
    }

    fn location_of(&self, span: Span) -> melon_diagnostics::Location {
        span.in_file(&self.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
prompt "agent:v1.0|mode:strict" {
    proc {
        S0(init) -> S1(format: Output)
    }
    schema Output {
        response: string,
    }
}
"#;

    #[test]
    fn parses_minimal_prompt() {
        let program = parse_source(MINIMAL, "<test>").unwrap();
        assert_eq!(program.prompt.name, "agent");
        assert_eq!(program.prompt.version, "v1.0");
        assert_eq!(program.prompt.mode, "strict");
        assert_eq!(program.prompt.blocks.proc.states.len(), 2);
        assert_eq!(program.prompt.blocks.schemas.len(), 1);
    }

    #[test]
    fn parses_imports() {
        let source = r#"
import ontology from "./ontology.json"
import extra from "./extra.json"

prompt "a:1|mode:strict" {
    proc { S0(format: Out) }
    schema Out { r: string, }
}
"#;
        let program = parse_source(source, "<test>").unwrap();
        assert_eq!(program.imports.len(), 2);
        assert_eq!(program.imports[0].name, "ontology");
        assert_eq!(program.imports[0].path, "./ontology.json");
        assert_eq!(program.imports[1].name, "extra");
    }

    #[test]
    fn missing_proc_block_is_a_parse_error() {
        let source = r#"
prompt "a:1|mode:strict" {
    schema Out { r: string, }
}
"#;
        let err = parse_source(source, "<test>").unwrap_err();
        assert!(err.message.contains("Prompt must contain a proc block"));
        assert_eq!(err.code(), "E100");
    }

    #[test]
    fn prompt_header_shape_is_enforced() {
        let bad_headers = [
            ("\"agent v1\"", "Invalid prompt header format"),
            ("\"agent|mode:strict\"", "Invalid name:version format"),
            ("\"agent:v1|strict\"", "Invalid mode format"),
            ("\"agent:v1|kind:strict\"", "Invalid mode format"),
        ];
        for (header, expected) in bad_headers {
            let source = format!("prompt {} {{ proc {{ S0(x) }} }}", header);
            let err = parse_source(&source, "<test>").unwrap_err();
            assert!(
                err.message.contains(expected),
                "header {}: got {}",
                header,
                err.message
            );
        }
    }

    #[test]
    fn state_ids_must_be_sequential() {
        let source = r#"
prompt "a:1|mode:strict" {
    proc { S0(a) -> S2(b) }
}
"#;
        let err = parse_source(source, "<test>").unwrap_err();
        assert!(err.message.contains("Expected state S1, got S2"));
    }

    #[test]
    fn state_bodies_parse_to_their_variants() {
        let source = r#"
prompt "a:1|mode:strict" {
    proc { S0(init) -> S1(exec: tools.search) -> S2(format: Out) }
    schema Out { r: string, }
}
"#;
        let program = parse_source(source, "<test>").unwrap();
        let states = &program.prompt.blocks.proc.states;
        assert_eq!(states[0].body, StateBody::Label("init".into()));
        assert_eq!(states[1].body, StateBody::Exec("search".into()));
        assert_eq!(states[2].body, StateBody::Format("Out".into()));
    }

    #[test]
    fn empty_state_body_is_rejected() {
        let source = r#"
prompt "a:1|mode:strict" {
    proc { S0() }
}
"#;
        let err = parse_source(source, "<test>").unwrap_err();
        assert!(err.message.contains("Expected state body"));
    }

    #[test]
    fn type_grammar_nests() {
        let source = r#"
prompt "a:1|mode:strict" {
    schema Out {
        tags: array(enum(red, green, blue)),
        nested: array(array(int)),
        other: Other,
    }
    proc { S0(format: Out) }
    schema Other { x: json, }
}
"#;
        let program = parse_source(source, "<test>").unwrap();
        let fields = &program.prompt.blocks.schemas[0].fields;
        assert_eq!(
            fields[0].ty,
            Type::Array(Box::new(Type::Enum(vec![
                "red".into(),
                "green".into(),
                "blue".into()
            ])))
        );
        assert_eq!(
            fields[1].ty,
            Type::Array(Box::new(Type::Array(Box::new(Type::Primitive(
                Primitive::Int
            )))))
        );
        assert_eq!(fields[2].ty, Type::SchemaRef("Other".into()));
    }

    #[test]
    fn persona_with_axiom_traits_and_example() {
        let source = r#"
prompt "a:1|mode:strict" {
    persona {
        axiom: ontology.axioms.identity as Pointer,
        traits {
            helpfulness: 0.9,
            verbosity: 0.4,
        }
        example(negative, on: verbosity) {
            if: ontology.examples.bad.if as Pointer,
            then: ontology.examples.bad.then as Pointer,
        }
    }
    proc { S0(format: Out) }
    schema Out { r: string, }
}
"#;
        let program = parse_source(source, "<test>").unwrap();
        let persona = program.prompt.blocks.persona.unwrap();
        match persona.axiom.as_ref() {
            Some(Content::Unresolved { path, .. }) => {
                assert_eq!(path, "ontology.axioms.identity")
            }
            other => panic!("Expected unresolved axiom pointer, got {:?}", other),
        }
        assert_eq!(persona.traits.get("helpfulness"), Some(&0.9));
        assert_eq!(persona.examples.len(), 1);
        assert_eq!(persona.examples[0].polarity, Polarity::Negative);
        assert_eq!(persona.examples[0].trait_name, "verbosity");
    }

    #[test]
    fn pointer_paths_accept_keyword_segments() {
        let source = r#"
prompt "a:1|mode:strict" {
    tools {
        tool search(q: string) -> json {
            purpose: ontology.tools.search.purpose as Pointer,
        }
    }
    proc { S0(format: Out) }
    schema Out { r: string, }
}
"#;
        let program = parse_source(source, "<test>").unwrap();
        let tool = &program.prompt.blocks.tools.as_ref().unwrap().tools[0];
        match tool.properties.get("purpose") {
            Some(Content::Unresolved { path, .. }) => {
                assert_eq!(path, "ontology.tools.search.purpose")
            }
            other => panic!("Expected unresolved property pointer, got {:?}", other),
        }
    }

    #[test]
    fn tool_signature_parses() {
        let source = r#"
prompt "a:1|mode:strict" {
    tools {
        tool analyze(data: json, depth: int) -> array(string) {
            purpose: ontology.tools.analyze.purpose as Pointer,
        }
    }
    proc { S0(format: Out) }
    schema Out { r: string, }
}
"#;
        let program = parse_source(source, "<test>").unwrap();
        let tool = &program.prompt.blocks.tools.as_ref().unwrap().tools[0];
        assert_eq!(tool.name, "analyze");
        assert_eq!(tool.parameters.len(), 2);
        assert_eq!(tool.parameters[1].ty, Type::Primitive(Primitive::Int));
        assert_eq!(
            tool.return_type,
            Type::Array(Box::new(Type::Primitive(Primitive::String)))
        );
    }

    #[test]
    fn meta_block_directives() {
        let source = r#"
prompt "a:1|mode:strict" {
    meta {
        checksum: true,
        confidence_token: false,
        custom_flag: true,
    }
    proc { S0(format: Out) }
    schema Out { r: string, }
}
"#;
        let program = parse_source(source, "<test>").unwrap();
        let meta = program.prompt.blocks.meta.unwrap();
        assert!(meta.directive("checksum"));
        assert!(!meta.directive("confidence_token"));
        assert!(meta.directive("custom_flag"));
        assert!(!meta.directive("absent"));
    }

    #[test]
    fn enum_requires_at_least_one_value() {
        let source = r#"
prompt "a:1|mode:strict" {
    schema Out { r: enum(), }
    proc { S0(format: Out) }
}
"#;
        let err = parse_source(source, "<test>").unwrap_err();
        assert!(err.message.contains("Expected enum value"));
    }

    #[test]
    fn syntax_errors_carry_got_hint() {
        let err = parse_source("prompt 42", "<test>").unwrap_err();
        assert_eq!(err.hint.as_deref(), Some("Got NumberLiteral"));
    }
}
