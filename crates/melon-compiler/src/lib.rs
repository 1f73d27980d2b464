//! Melon compiler back half: type checking, pointer resolution, code
//! generation, and the pipeline driver that strings the stages together.
//!
//! The front half (lexer, parser) lives in `melon-lexer` and
//! `melon-parser`; diagnostics are shared through `melon-diagnostics`.

pub mod codegen;
pub mod driver;
pub mod resolver;
pub mod typecheck;

pub use codegen::{CodeGenerator, GenOptions, SectionStats, Stats};
pub use driver::{
    compile, validate, CompileOptions, CompileResult, ValidateOptions, ValidateResult,
};
pub use resolver::PointerResolver;
pub use typecheck::{CheckOutcome, TypeChecker};

pub use melon_diagnostics::{CompileError, ErrorKind, Location, Result, Span, Warning};
