//! fax-util - shared foundation types for the fax preprocessor/calculator toolchain.
//!
//! Three concerns live here because both `fax-pp` and `fax-calc` need them:
//! interned strings (`symbol`), pooled allocation (`pool`), diagnostics
//! (`diagnostic`), and the error types both pipeline stages propagate
//! (`error`).

pub mod diagnostic;
pub mod error;
pub mod pool;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use error::{CalcError, PpError};
pub use pool::Pool;
pub use span::Span;
pub use symbol::{djb2_xor_hash, StringCache, Symbol};
