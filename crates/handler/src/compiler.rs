use std::sync::Arc;

use indexmap::IndexMap;
use parser::types::ConstDirective;
use resolvegate_schema::{ComposedSchema, MetaField, TypeExt};
use value::{ConstValue, Name};

use crate::args::{FieldNodeType, ResolverArgs};
use crate::{CompileError, ResolveCondition, ResolverSpec};

pub const RESOLVE_TO_BY: &str = "resolveToBy";

/// Extension key marking a field whose directives have been compiled.
pub const CONDITION_RESOLVERS: &str = "conditionResolvers";

/// Turns a directive argument literal into a plain value. Enum values become
/// strings.
pub fn parse_literal(value: &ConstValue) -> ConstValue {
    match value {
        ConstValue::Enum(name) => ConstValue::String(name.to_string()),
        ConstValue::List(items) => ConstValue::List(items.iter().map(parse_literal).collect()),
        ConstValue::Object(object) => ConstValue::Object(
            object
                .iter()
                .map(|(name, value)| (name.clone(), parse_literal(value)))
                .collect(),
        ),
        value => value.clone(),
    }
}

/// Collects the `@resolveToBy` chains of a schema.
#[derive(Default)]
pub struct DirectiveCompiler {
    conditions: Vec<ResolveCondition>,
}

impl DirectiveCompiler {
    /// Compiles every annotated object and interface field in declaration
    /// order and marks it so a later pass leaves it alone.
    pub fn compile(
        mut self,
        schema: &mut ComposedSchema,
    ) -> Result<Vec<ResolveCondition>, CompileError> {
        schema.map_composite_fields(|type_name, field| self.compile_field(type_name, field))?;
        Ok(self.conditions)
    }

    fn compile_field(
        &mut self,
        type_name: &Name,
        field: &mut MetaField,
    ) -> Result<(), CompileError> {
        if field.has_extension(CONDITION_RESOLVERS) {
            return Ok(());
        }

        let node_type = FieldNodeType::from(field.ty.field_kind());
        let occurrences = field
            .directives_by_name(RESOLVE_TO_BY)
            .map(|directive| directive_args(directive, type_name, &field.name, node_type))
            .collect::<Vec<_>>();
        if occurrences.is_empty() {
            return Ok(());
        }

        let mut resolvers = Vec::with_capacity(occurrences.len());
        for occurrence in &occurrences {
            let args: ResolverArgs = value::from_value(occurrence.clone()).map_err(|err| {
                CompileError::InvalidArguments {
                    type_name: type_name.to_string(),
                    field_name: field.name.to_string(),
                    err,
                }
            })?;
            resolvers.push(Arc::new(ResolverSpec::compile(args)?));
        }

        tracing::debug!(
            type_name = %type_name,
            field_name = %field.name,
            resolvers = resolvers.len(),
            "Compiled resolveToBy chain."
        );

        field.extensions.insert(
            CONDITION_RESOLVERS.to_string(),
            ConstValue::List(occurrences),
        );
        self.conditions.push(ResolveCondition {
            type_name: type_name.clone(),
            field_name: field.name.clone(),
            field_kind: node_type.into(),
            resolvers,
        });
        Ok(())
    }
}

fn directive_args(
    directive: &ConstDirective,
    type_name: &Name,
    field_name: &Name,
    node_type: FieldNodeType,
) -> ConstValue {
    let mut args = directive
        .arguments
        .iter()
        .map(|(name, value)| (name.node.clone(), parse_literal(&value.node)))
        .collect::<IndexMap<_, _>>();
    args.insert(
        Name::new("targetTypeName"),
        ConstValue::String(type_name.to_string()),
    );
    args.insert(
        Name::new("targetFieldName"),
        ConstValue::String(field_name.to_string()),
    );
    args.insert(
        Name::new("targetFieldNodeType"),
        ConstValue::String(node_type.as_str().to_string()),
    );
    ConstValue::Object(args)
}
