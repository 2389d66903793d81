use thiserror::Error;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum SchemaError {
    #[error("Type '{type_name}' is not defined.")]
    UnknownType { type_name: String },

    #[error("Field '{type_name}.{field_name}' is not defined.")]
    UnknownField {
        type_name: String,
        field_name: String,
    },

    #[error("Type '{type_name}' cannot have a path '{path}'.")]
    InvalidPath { type_name: String, path: String },

    #[error("{path} doesn't implement {type_name}.")]
    NotImplemented { path: String, type_name: String },
}
