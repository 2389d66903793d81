#![forbid(unsafe_code)]

mod composed_schema;
mod error;
mod type_ext;
mod value_ext;
mod value_path;

pub use composed_schema::{ComposedSchema, MetaField, MetaType, TypeKind};
pub use error::SchemaError;
pub use type_ext::{FieldKind, TypeExt};
pub use value_ext::ValueExt;
pub use value_path::{get_segments, PathSegment, ValuePath};
