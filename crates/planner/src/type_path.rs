use parser::types::Type;
use resolvegate_schema::{ComposedSchema, MetaType, PathSegment, SchemaError, TypeExt, ValuePath};

/// Follows `path` from a field of type `ty` and returns the named type it
/// reaches. List and non-null wrappers are transparent, and index segments
/// address list levels without moving through the type graph.
pub fn type_by_path<'a>(
    schema: &'a ComposedSchema,
    ty: &Type,
    path: &ValuePath,
) -> Result<&'a MetaType, SchemaError> {
    let mut current = named_type(schema, ty)?;

    for (idx, segment) in path.segments().iter().enumerate() {
        let field_name = match segment {
            PathSegment::Index(_) => continue,
            PathSegment::Key(key) => key,
        };

        if !current.has_fields() {
            return Err(SchemaError::InvalidPath {
                type_name: current.name.to_string(),
                path: join_segments(&path.segments()[idx..]),
            });
        }

        let field = current
            .field_by_name(field_name)
            .ok_or_else(|| SchemaError::UnknownField {
                type_name: current.name.to_string(),
                field_name: field_name.clone(),
            })?;
        current = named_type(schema, &field.ty)?;
    }

    Ok(current)
}

fn named_type<'a>(schema: &'a ComposedSchema, ty: &Type) -> Result<&'a MetaType, SchemaError> {
    schema
        .concrete_type_by_name(ty)
        .ok_or_else(|| SchemaError::UnknownType {
            type_name: ty.concrete_typename().to_string(),
        })
}

fn join_segments(segments: &[PathSegment]) -> String {
    segments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}
