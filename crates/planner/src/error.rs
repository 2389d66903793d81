use resolvegate_schema::SchemaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Invalid selection set: {0}")]
    Syntax(#[from] parser::Error),

    #[error("'{source_text}' is not a single selection set.")]
    NotASelectionSet { source_text: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
