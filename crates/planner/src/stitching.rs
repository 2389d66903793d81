use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use indexmap::IndexMap;
use parser::types::{Field, SelectionSet};
use parser::Positioned;
use resolvegate_schema::{ComposedSchema, TypeExt};
use value::Name;

use crate::collect::{collect_fields, Fragments};
use crate::selection::{
    empty_selection_set, field_selection_set, new_field, parse_selection_set, print_field,
    selection_set_contains_top_level_field,
};
use crate::PlanError;

/// A field node shared between every entry of the index that needs it.
pub type FieldNode = Arc<Positioned<Field>>;

/// Computes the selections a field needs from the field node being resolved.
#[derive(Clone)]
pub struct DynamicSelectionSet(Arc<dyn Fn(&Field) -> SelectionSet + Send + Sync>);

impl DynamicSelectionSet {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Field) -> SelectionSet + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn call(&self, field: &Field) -> SelectionSet {
        (self.0)(field)
    }
}

impl Debug for DynamicSelectionSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("DynamicSelectionSet")
    }
}

/// Selections a resolver declares for the field it is attached to.
#[derive(Debug, Clone)]
pub enum FieldSelectionSet {
    Static(String),
    Dynamic(DynamicSelectionSet),
}

#[derive(Debug)]
pub struct Subschema {
    pub name: String,
    pub schema: Arc<ComposedSchema>,
}

#[derive(Debug, Default, Clone)]
pub struct MergedTypeInfo {
    /// Base selections each subschema needs to resolve the type.
    pub selection_sets: Vec<(Arc<Subschema>, SelectionSet)>,

    /// Selections each subschema needs to resolve individual fields.
    pub field_selection_sets: Vec<(Arc<Subschema>, IndexMap<Name, SelectionSet>)>,
}

/// The required-selection index of a stitched schema.
#[derive(Debug, Default, Clone)]
pub struct StitchingInfo {
    pub field_nodes_by_type: IndexMap<Name, Vec<FieldNode>>,
    pub field_nodes_by_field: IndexMap<Name, IndexMap<Name, Vec<FieldNode>>>,
    pub dynamic_selection_sets_by_field: IndexMap<Name, IndexMap<Name, Vec<DynamicSelectionSet>>>,
    pub merged_types: IndexMap<Name, MergedTypeInfo>,
}

impl StitchingInfo {
    #[inline]
    pub fn field_nodes(&self, type_name: &str, field_name: &str) -> &[FieldNode] {
        self.field_nodes_by_field
            .get(type_name)
            .and_then(|fields| fields.get(field_name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

type SelectionSetsByField = IndexMap<Name, IndexMap<Name, Vec<SelectionSet>>>;

/// Rebuilds the field node index of `info` once resolvers declaring their own
/// selection sets have been added to `schema`.
pub fn complete_stitching_info<'a, I>(
    mut info: StitchingInfo,
    resolver_selection_sets: I,
    schema: &ComposedSchema,
) -> Result<StitchingInfo, PlanError>
where
    I: IntoIterator<Item = (&'a str, &'a str, &'a FieldSelectionSet)>,
{
    let root_types = [Some(schema.query_type()), schema.mutation_type()];
    for root_type in root_types.into_iter().flatten() {
        if schema.type_by_name(root_type).is_some() {
            info.field_nodes_by_type
                .insert(Name::new(root_type), vec![typename_field_node()]);
        }
    }

    let mut selection_sets_by_field = SelectionSetsByField::new();

    for (type_name, merged_type) in &info.merged_types {
        for (subschema, selection_set) in &merged_type.selection_sets {
            let ty = match subschema.schema.type_by_name(type_name) {
                Some(ty) => ty,
                None => {
                    tracing::warn!(
                        subschema = %subschema.name,
                        type_name = %type_name,
                        "Merged type is not defined in its subschema."
                    );
                    continue;
                }
            };
            for (field_name, field) in &ty.fields {
                let leaf = subschema.schema.is_leaf_type(field.ty.concrete_typename());
                if leaf && selection_set_contains_top_level_field(selection_set, field_name) {
                    continue;
                }
                push_selection_set(
                    &mut selection_sets_by_field,
                    type_name,
                    field_name,
                    selection_set.clone(),
                    true,
                );
            }
        }

        for (_, field_selection_sets) in &merged_type.field_selection_sets {
            for (field_name, selection_set) in field_selection_sets {
                push_selection_set(
                    &mut selection_sets_by_field,
                    type_name,
                    field_name,
                    selection_set.clone(),
                    true,
                );
            }
        }
    }

    for (type_name, field_name, field_selection_set) in resolver_selection_sets {
        match schema.type_by_name(type_name) {
            Some(ty) if ty.has_fields() => {}
            Some(_) => continue,
            None => {
                tracing::warn!(
                    type_name = %type_name,
                    "Resolver type is not defined in the schema."
                );
                continue;
            }
        }

        match field_selection_set {
            FieldSelectionSet::Dynamic(dynamic) => info
                .dynamic_selection_sets_by_field
                .entry(Name::new(type_name))
                .or_default()
                .entry(Name::new(field_name))
                .or_default()
                .push(dynamic.clone()),
            FieldSelectionSet::Static(text) => push_selection_set(
                &mut selection_sets_by_field,
                type_name,
                field_name,
                parse_selection_set(text)?,
                false,
            ),
        }
    }

    let fragments = Fragments::new();
    let mut canonical_nodes: HashMap<String, FieldNode> = HashMap::new();

    for (type_name, fields) in &selection_sets_by_field {
        let ty = match schema.type_by_name(type_name) {
            Some(ty) => ty,
            None => {
                tracing::warn!(type_name = %type_name, "Merged type is not defined in the schema.");
                continue;
            }
        };

        for (field_name, selection_sets) in fields {
            for selection_set in selection_sets {
                for (_, field_nodes) in collect_fields(schema, &fragments, ty, selection_set) {
                    for field_node in field_nodes {
                        let node = canonical_nodes
                            .entry(print_field(&field_node.node))
                            .or_insert_with(|| Arc::new(field_node))
                            .clone();
                        let entry = info
                            .field_nodes_by_field
                            .entry(type_name.clone())
                            .or_default()
                            .entry(field_name.clone())
                            .or_default();
                        if !entry.iter().any(|existing| Arc::ptr_eq(existing, &node)) {
                            entry.push(node);
                        }
                    }
                }
            }
        }
    }

    Ok(info)
}

fn push_selection_set(
    map: &mut SelectionSetsByField,
    type_name: &str,
    field_name: &str,
    selection_set: SelectionSet,
    include_typename: bool,
) {
    let entry = map
        .entry(Name::new(type_name))
        .or_default()
        .entry(Name::new(field_name))
        .or_default();
    if include_typename && entry.is_empty() {
        entry.push(field_selection_set("__typename"));
    }
    entry.push(selection_set);
}

fn typename_field_node() -> FieldNode {
    Arc::new(new_field("__typename", empty_selection_set()))
}
