use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A fatal structural error in the ZeptoN source itself.
///
/// Structural errors are detected before any backend invocation:
/// a missing `prog` or `begin` keyword, a program name that does not
/// match the source file name, an identifier using the reserved `_`/`$`
/// prefix, or an unterminated comment or literal. They abort the
/// transpile of the current file; no generated unit is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralError {
    pub message: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl StructuralError {
    pub fn new(message: impl Into<String>) -> Self {
        StructuralError {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(message: impl Into<String>, line: u32, column: u32) -> Self {
        StructuralError {
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                write!(f, "{} on line: {} position: {}", self.message, line, column)
            }
            (Some(line), None) => write!(f, "{} on line: {}", self.message, line),
            _ => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for StructuralError {}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Structural(#[from] StructuralError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("backend compiler failure: {0}")]
    Backend(String),
    #[error("file '{0}' does not exist or is unreadable")]
    MissingSource(PathBuf),
    #[error("file '{0}' does not have the '.zep' extension")]
    NotZeptonSource(PathBuf),
    #[error("file '{0}' is too small to be a ZeptoN program")]
    SourceTooSmall(PathBuf),
}
