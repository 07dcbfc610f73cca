use crate::ast::BinaryOp;
use crate::diagnostic::{Diagnostic, Label, Span};
use crate::types::Type;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    #[error("undefined identifier `{name}`")]
    UndefinedIdentifier { name: String, span: Span },

    #[error("incompatible operand types for `{op}`: {left} and {right}")]
    IncompatibleOperands {
        op: BinaryOp,
        left: Type,
        right: Type,
        span: Span,
    },

    #[error("not callable: {found}")]
    NotCallable { found: Type, span: Span },

    #[error("arity mismatch: expected {expected} argument(s), found {found}")]
    ArityMismatch {
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("argument type mismatch: argument {index} expects {expected}, found {found}")]
    ArgumentMismatch {
        index: usize,
        expected: Type,
        found: Type,
        span: Span,
    },

    #[error("return type mismatch in `{name}`: declared {expected}, body yields {found}")]
    ReturnMismatch {
        name: String,
        expected: Type,
        found: Type,
        span: Span,
    },

    #[error("`{name}` is annotated {expected} but assigned {found}")]
    AnnotationMismatch {
        name: String,
        expected: Type,
        found: Type,
        span: Span,
    },

    #[error("pattern of type {found} cannot match a subject of type {expected}")]
    PatternMismatch {
        expected: Type,
        found: Type,
        span: Span,
    },

    #[error("unknown type `{name}`")]
    UnknownType { name: String, span: Span },

    #[error("no type rule for {kind}")]
    NoRule { kind: &'static str, span: Span },
}

impl TypeError {
    pub fn span(&self) -> Span {
        match self {
            Self::UndefinedIdentifier { span, .. }
            | Self::IncompatibleOperands { span, .. }
            | Self::NotCallable { span, .. }
            | Self::ArityMismatch { span, .. }
            | Self::ArgumentMismatch { span, .. }
            | Self::ReturnMismatch { span, .. }
            | Self::AnnotationMismatch { span, .. }
            | Self::PatternMismatch { span, .. }
            | Self::UnknownType { span, .. }
            | Self::NoRule { span, .. } => *span,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::UndefinedIdentifier { .. } => "E0201",
            Self::IncompatibleOperands { .. } => "E0202",
            Self::NotCallable { .. } => "E0203",
            Self::ArityMismatch { .. } => "E0204",
            Self::ArgumentMismatch { .. } => "E0205",
            Self::ReturnMismatch { .. } => "E0206",
            Self::AnnotationMismatch { .. } => "E0207",
            Self::PatternMismatch { .. } => "E0208",
            Self::UnknownType { .. } => "E0209",
            Self::NoRule { .. } => "E0210",
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string())
            .with_code(self.code())
            .with_label(Label::primary(self.span(), ""));
        match self {
            Self::NoRule { .. } => diag.with_help("run without --check to skip the static pass"),
            _ => diag,
        }
    }
}
