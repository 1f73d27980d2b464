/// Pipeline orchestration
///
/// Runs lex -> parse -> check -> resolve -> generate and folds every
/// outcome into a structured result. Callers always get a result value;
/// stage failures land in its `errors` list instead of propagating.

use std::path::Path;

use tracing::debug;

use melon_diagnostics::{CompileError, Warning};
use melon_lexer::tokenize;
use melon_parser::{ast::Program, parse};

use crate::codegen::{CodeGenerator, GenOptions, Stats};
use crate::resolver::PointerResolver;
use crate::typecheck::TypeChecker;

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Label attached to diagnostics, usually the source file name.
    pub filename: String,
    pub optimization_level: u8,
    pub checksum: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            filename: "<input>".to_string(),
            optimization_level: 3,
            checksum: false,
        }
    }
}

#[derive(Debug)]
pub struct CompileResult {
    pub success: bool,
    pub output: Option<String>,
    pub errors: Vec<CompileError>,
    pub warnings: Vec<Warning>,
    pub stats: Option<Stats>,
}

#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub filename: String,
    /// When set, a valid program additionally has its pointers resolved
    /// against the ontology files on disk.
    pub check_pointers: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            filename: "<input>".to_string(),
            check_pointers: true,
        }
    }
}

#[derive(Debug)]
pub struct ValidateResult {
    pub valid: bool,
    pub errors: Vec<CompileError>,
    pub warnings: Vec<Warning>,
}

/// Compile `.mln` source to compact output. Imports are resolved
/// relative to `base_dir`.
pub async fn compile(source: &str, base_dir: &Path, options: CompileOptions) -> CompileResult {
    let mut result = CompileResult {
        success: false,
        output: None,
        errors: Vec::new(),
        warnings: Vec::new(),
        stats: None,
    };

    let mut program = match front_end(source, &options.filename) {
        Ok(program) => program,
        Err(error) => {
            result.errors.push(error);
            return result;
        }
    };

    let outcome = TypeChecker::new(&program, &options.filename).check();
    result.warnings = outcome.warnings;
    if !outcome.valid {
        result.errors = outcome.errors;
        return result;
    }
    debug!(warnings = result.warnings.len(), "type check passed");

    let resolver = PointerResolver::new(base_dir, &options.filename);
    if let Err(error) = resolver.resolve(&mut program).await {
        result.errors.push(error);
        return result;
    }
    debug!("pointers resolved");

    let generator = CodeGenerator::new(
        &program,
        GenOptions {
            optimization_level: options.optimization_level,
            checksum: options.checksum,
        },
    );
    let output = generator.generate();
    let stats = generator.stats();
    debug!(length = stats.output_length, "generated output");

    result.success = true;
    result.output = Some(output);
    result.stats = Some(stats);
    result
}

/// Validate without generating output.
pub async fn validate(source: &str, base_dir: &Path, options: ValidateOptions) -> ValidateResult {
    let mut result = ValidateResult {
        valid: false,
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    let mut program = match front_end(source, &options.filename) {
        Ok(program) => program,
        Err(error) => {
            result.errors.push(error);
            return result;
        }
    };

    let outcome = TypeChecker::new(&program, &options.filename).check();
    result.valid = outcome.valid;
    result.errors = outcome.errors;
    result.warnings = outcome.warnings;

    if options.check_pointers && result.valid {
        let resolver = PointerResolver::new(base_dir, &options.filename);
        if let Err(error) = resolver.resolve(&mut program).await {
            result.valid = false;
            result.errors.push(error);
        }
    }

    result
}

fn front_end(source: &str, filename: &str) -> melon_diagnostics::Result<Program> {
    let tokens = tokenize(source, filename)?;
    debug!(tokens = tokens.len(), "lexed source");
    parse(tokens, filename)
}
