#![forbid(unsafe_code)]

mod error;
mod eval;
mod parser;
mod scope;
mod template;

use std::fmt::{self, Display, Formatter};

pub use error::ExprError;
pub use scope::Scope;
pub use template::Template;
use value::ConstValue;

use crate::parser::Expr;

/// A parsed condition or filter expression.
///
/// Expressions only see the variables supplied through a [`Scope`]; there is
/// no access to anything outside of it.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    expr: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        Ok(Self {
            source: source.to_string(),
            expr: parser::parse(source)?,
        })
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate(&self, scope: &Scope<'_>) -> Result<ConstValue, ExprError> {
        eval::evaluate(&self.expr, scope).map(|value| value.into_owned())
    }

    pub fn evaluate_bool(&self, scope: &Scope<'_>) -> Result<bool, ExprError> {
        eval::evaluate(&self.expr, scope).map(|value| eval::is_truthy(&value))
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
