//! C-preprocessor semantics on top of `fax-lex`'s token stream: macro
//! expansion, conditional compilation, `#include`, and the
//! `#if`/`#elif` constant-expression evaluator.
//!
//! `fax-pp` has no opinion about where source text comes from beyond the
//! entry buffer — `#include` resolution is supplied by the caller through
//! [`IncludeResolver`], matching how `fax-drv` wires a filesystem resolver
//! in and how tests wire an in-memory one.

pub mod conditional;
pub mod context;
pub mod define;
pub mod eval;
pub mod expand;
pub mod filename_cache;
pub mod include;
pub mod preprocess;

pub use context::{Context, IncludeKind, IncludeResolver, NoIncludes};
pub use define::{Define, MacroTable};
pub use preprocess::{preprocess, Diagnostic, PreprocessResult};
