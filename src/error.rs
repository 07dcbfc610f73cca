use crate::checker::TypeError;
use crate::diagnostic::{Diagnostic, Span};
use crate::interpreter::{ParseError, RuntimeError};
use crate::lexer::LexError;
use thiserror::Error;

/// Any failure from one of the four passes.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("type error: {0}")]
    Type(#[from] TypeError),
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl Error {
    pub fn span(&self) -> Span {
        match self {
            Self::Lex(e) => e.span(),
            Self::Parse(e) => e.span(),
            Self::Type(e) => e.span(),
            Self::Runtime(e) => e.span(),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Lex(e) => e.to_diagnostic(),
            Self::Parse(e) => e.to_diagnostic(),
            Self::Type(e) => e.to_diagnostic(),
            Self::Runtime(e) => e.to_diagnostic(),
        }
    }
}
