//! Core pipeline for the ZeptoN transcompiler.
//!
//! ZeptoN source is compiled by rewriting it into host-language (Java)
//! text and handing the result to the host compiler. The pipeline is
//! roughly:
//!
//!   source .zep
//!     -> normalize  (comments blanked, literal bodies escaped)
//!     -> lexer      (image-preserving tokens)
//!     -> rewriter   (generated host unit, line numbers preserved)
//!     -> backend    (javac)
//!     -> reporter   (diagnostics against the generated text)
//!
//! Higher-level tools (the `zepc` CLI) should depend on this crate
//! rather than reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling and configuration
// ---------------------------------------------------------------------

pub mod config;
pub mod error;

// ---------------------------------------------------------------------
// Front-end: normalization, lexing, rewriting
// ---------------------------------------------------------------------

pub mod lexer;
pub mod normalize;
pub mod rewriter;

// ---------------------------------------------------------------------
// Injected runtime environment
// ---------------------------------------------------------------------

pub mod support;

// ---------------------------------------------------------------------
// Back-end: host compiler, driver, diagnostic reporting
// ---------------------------------------------------------------------

pub mod backend;
pub mod compiler;
pub mod reporter;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use backend::{
    Backend, BackendOptions, BackendOutcome, Diagnostic, DiagnosticKind, JavacBackend,
};
pub use compiler::{
    BatchSummary, CompileOutcome, collect_sources, compile_batch, compile_file, compile_unit,
    transpile, transpile_file, verify_file,
};
pub use config::{Config, Verbosity};
pub use error::{CoreError, StructuralError};
pub use lexer::{Token, TokenKind, TokenSource, lex};
pub use normalize::normalize;
pub use reporter::Reporter;
pub use rewriter::{ProgramUnit, rewrite};
