use std::collections::HashMap;

use resolvegate_expression::ExprError;
use resolvegate_planner::PlanError;
use serde::Serialize;
use thiserror::Error;
use value::{ConstValue, DeserializerError};

/// Errors raised while compiling `@resolveToBy` directives.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Invalid @resolveToBy arguments on '{type_name}.{field_name}': {err}")]
    InvalidArguments {
        type_name: String,
        field_name: String,
        err: DeserializerError,
    },

    #[error("'sourceArgs' of '{type_name}.{field_name}' may only contain strings and objects, found '{value}' at '{path}'.")]
    InvalidSourceArg {
        type_name: String,
        field_name: String,
        path: String,
        value: ConstValue,
    },

    #[error("Invalid expression '{source_text}' on '{type_name}.{field_name}': {err}")]
    Expression {
        type_name: String,
        field_name: String,
        source_text: String,
        err: ExprError,
    },

    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Errors raised while resolving a field.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{message}")]
    NotFound { message: String, path: Vec<String> },

    #[error("Field '{type_name}.{field_name}' has no resolver.")]
    NoResolver {
        type_name: String,
        field_name: String,
    },

    #[error("Subscriptions require a pubsub in the resolver context.")]
    MissingPubSub,

    #[error("Field '{type_name}.{field_name}' has no pubsub topic.")]
    MissingTopic {
        type_name: String,
        field_name: String,
    },

    #[error(transparent)]
    Expression(#[from] ExprError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

impl ResolveError {
    pub fn code(&self) -> Option<&'static str> {
        match self {
            ResolveError::NotFound { .. } => Some("NOT_FOUND"),
            _ => None,
        }
    }

    pub fn to_server_error(&self) -> ServerError {
        let mut error = ServerError::new(self.to_string());
        if let ResolveError::NotFound { path, .. } = self {
            error.path = path.iter().cloned().map(ConstValue::String).collect();
        }
        if let Some(code) = self.code() {
            error
                .extensions
                .insert("code".to_string(), ConstValue::String(code.to_string()));
        }
        error
    }
}

#[derive(Debug, Serialize)]
pub struct ServerError {
    pub message: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<ConstValue>,

    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub extensions: HashMap<String, ConstValue>,
}

impl ServerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Default::default(),
            extensions: Default::default(),
        }
    }
}
