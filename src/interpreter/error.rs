use crate::diagnostic::{Diagnostic, Label, Span};
use crate::types::Type;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("unknown identifier `{name}`")]
    UnknownIdentifier { name: String, span: Span },

    #[error("access violation: `{name}` is restricted")]
    AccessViolation { name: String, span: Span },

    #[error("type mismatch: `{name}` expects {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: Type,
        found: Type,
        span: Span,
    },

    #[error("unknown type `{name}`")]
    UnknownType { name: String, span: Span },

    #[error("{message}")]
    Operation { message: String, span: Span },

    #[error("value of type {found} is not callable")]
    NotCallable { found: String, span: Span },

    #[error("no matching pattern for {value}")]
    NoMatchingPattern { value: String, span: Span },

    #[error("{name}: {message}")]
    Builtin {
        name: &'static str,
        message: String,
        span: Span,
    },

    #[error("maximum call depth of {limit} exceeded")]
    RecursionLimit { limit: usize, span: Span },

    #[error("task #{id} was cancelled before it started")]
    TaskCancelled { id: u64 },

    #[error("task #{id} did not finish in time")]
    TaskUnfinished { id: u64 },

    #[error("task #{id} panicked: {message}")]
    TaskPanicked { id: u64, message: String },

    #[error("task #{id} could not be started: {message}")]
    TaskNotStarted { id: u64, message: String },
}

impl RuntimeError {
    pub fn unknown_identifier_at(name: impl Into<String>, span: Span) -> Self {
        Self::UnknownIdentifier { name: name.into(), span }
    }

    pub fn operation_at(message: impl Into<String>, span: Span) -> Self {
        Self::Operation { message: message.into(), span }
    }

    pub fn builtin_at(name: &'static str, message: impl Into<String>, span: Span) -> Self {
        Self::Builtin {
            name,
            message: message.into(),
            span,
        }
    }

    /// Get the span associated with this error
    pub fn span(&self) -> Span {
        match self {
            Self::UnknownIdentifier { span, .. }
            | Self::AccessViolation { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::UnknownType { span, .. }
            | Self::Operation { span, .. }
            | Self::NotCallable { span, .. }
            | Self::NoMatchingPattern { span, .. }
            | Self::Builtin { span, .. }
            | Self::RecursionLimit { span, .. } => *span,
            Self::TaskCancelled { .. }
            | Self::TaskUnfinished { .. }
            | Self::TaskPanicked { .. }
            | Self::TaskNotStarted { .. } => Span::dummy(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownIdentifier { .. } => "E0301",
            Self::AccessViolation { .. } => "E0302",
            Self::TypeMismatch { .. } => "E0303",
            Self::UnknownType { .. } => "E0304",
            Self::Operation { .. } => "E0305",
            Self::NotCallable { .. } => "E0306",
            Self::NoMatchingPattern { .. } => "E0307",
            Self::Builtin { .. } => "E0308",
            Self::RecursionLimit { .. } => "E0309",
            Self::TaskCancelled { .. }
            | Self::TaskUnfinished { .. }
            | Self::TaskPanicked { .. }
            | Self::TaskNotStarted { .. } => "E0310",
        }
    }

    /// Convert to a diagnostic for pretty printing
    pub fn to_diagnostic(&self) -> Diagnostic {
        let label = match self {
            Self::UnknownIdentifier { .. } => "not found in this scope",
            Self::AccessViolation { .. } => "write blocked by the sandbox",
            Self::TypeMismatch { .. } => "value does not fit the annotation",
            Self::NoMatchingPattern { .. } => "no case matched this value",
            Self::RecursionLimit { .. } => "call made here",
            _ => "",
        };
        let diag = Diagnostic::error(self.to_string())
            .with_code(self.code())
            .with_label(Label::primary(self.span(), label));
        match self {
            Self::NoMatchingPattern { .. } => diag.with_help("add a `_ => ...` case"),
            Self::AccessViolation { name, .. } => {
                diag.with_note(format!("`{}` may not be rebound while sandboxed", name))
            }
            _ => diag,
        }
    }
}
