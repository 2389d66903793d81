use thiserror::Error;

use crate::parser::Span;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ExprError {
    #[error("Syntax error at offset {pos}: {message}")]
    Syntax { pos: usize, message: String },

    #[error("'{name}' is not defined.")]
    UnknownIdentifier { name: String },

    #[error("Cannot read property '{property}' of null.")]
    NullMember { property: String },

    #[error("'{method}' is not a supported method.")]
    UnknownMethod { method: String },

    #[error("'{method}' cannot be called on {receiver}.")]
    InvalidReceiver { method: String, receiver: String },
}

impl ExprError {
    pub(crate) fn syntax(pos: usize, message: impl Into<String>) -> Self {
        ExprError::Syntax {
            pos,
            message: message.into(),
        }
    }
}

impl<'a> From<nom::error::Error<Span<'a>>> for ExprError {
    fn from(err: nom::error::Error<Span<'a>>) -> Self {
        let pos = err.input.location_offset();
        match err.input.fragment().chars().next() {
            Some(c) => ExprError::syntax(pos, format!("unexpected '{}'", c)),
            None => ExprError::syntax(pos, "unexpected end of input"),
        }
    }
}
