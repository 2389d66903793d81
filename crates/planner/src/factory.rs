use std::collections::HashSet;

use indexmap::IndexMap;
use parser::types::{Selection, SelectionSet};
use parser::{Pos, Positioned};
use resolvegate_schema::{ComposedSchema, PathSegment, SchemaError, TypeExt, TypeKind, ValuePath};
use value::Name;

use crate::selection::{
    merge_selection_sets, parse_selection_set, print_field, wrap_in_field,
    wrap_in_inline_fragment,
};
use crate::stitching::{FieldNode, StitchingInfo};
use crate::type_path::type_by_path;
use crate::PlanError;

/// Where a field delegates to and how the delegated result is shaped.
#[derive(Debug, Copy, Clone)]
pub struct DelegationTarget<'a> {
    pub source_type_name: &'a str,
    pub source_field_name: &'a str,
    pub source_selection_set: Option<&'a str>,
    pub result: Option<&'a ValuePath>,
    pub result_type: Option<&'a str>,
    pub target_type_name: &'a str,
    pub target_field_name: &'a str,
}

/// Computes the selection set to request from a delegated source given the
/// selections requested on the annotated field.
#[derive(Debug, Clone)]
pub struct SelectionSetFactory {
    source_selection_set: Option<SelectionSet>,
    stitch_fields: Option<IndexMap<Name, Vec<FieldNode>>>,
    result_path: Option<ValuePath>,
    refinement: Option<Name>,
}

impl SelectionSetFactory {
    pub fn new(
        schema: &ComposedSchema,
        stitching_info: &StitchingInfo,
        target: DelegationTarget<'_>,
    ) -> Result<Self, PlanError> {
        let source_selection_set = target
            .source_selection_set
            .map(parse_selection_set)
            .transpose()?;

        let source_field = schema.field(target.source_type_name, target.source_field_name)?;
        let source_type_name = source_field.ty.concrete_typename();
        let result_type_name = match target.result_type {
            Some(result_type) => result_type,
            None => schema
                .field(target.target_type_name, target.target_field_name)?
                .ty
                .concrete_typename(),
        };

        let stitch_fields = stitching_info
            .field_nodes_by_field
            .get(source_type_name)
            .or_else(|| stitching_info.field_nodes_by_field.get(result_type_name))
            .cloned();

        let mut refinement = None;
        let result_path = target.result.filter(|path| !path.is_empty()).cloned();
        if let Some(path) = &result_path {
            let result_field_type = type_by_path(schema, &source_field.ty, path)?;
            if result_field_type.is_abstract()
                && result_field_type.name.as_str() != result_type_name
            {
                if let Some(result_type) = schema.type_by_name(result_type_name) {
                    if matches!(result_type.kind, TypeKind::Interface | TypeKind::Object)
                        && !schema.is_sub_type(result_field_type, result_type)
                    {
                        return Err(SchemaError::NotImplemented {
                            path: format!(
                                "{}.{}.{}",
                                target.source_type_name, target.source_field_name, path
                            ),
                            type_name: result_type_name.to_string(),
                        }
                        .into());
                    }
                }
                refinement = Some(Name::new(result_type_name));
            }
        }

        Ok(Self {
            source_selection_set,
            stitch_fields,
            result_path,
            refinement,
        })
    }

    /// Builds the selection set for one delegated call.
    pub fn build(&self, subtree: SelectionSet) -> SelectionSet {
        let subtree = self.stitch(subtree);
        let mut selection_set = match &self.source_selection_set {
            Some(source_selection_set) => merge_selection_sets(source_selection_set, &subtree),
            None => subtree,
        };

        if let Some(path) = &self.result_path {
            let mut innermost = true;
            for segment in path.segments().iter().rev() {
                let name = match segment {
                    PathSegment::Key(name) => name,
                    PathSegment::Index(_) => continue,
                };
                if innermost {
                    if let Some(refinement) = &self.refinement {
                        selection_set = wrap_in_inline_fragment(refinement, selection_set);
                    }
                    innermost = false;
                }
                selection_set = wrap_in_field(name, selection_set);
            }
        }

        selection_set
    }

    /// Appends the indexed field nodes required by each top-level field of
    /// `subtree`. Nodes already selected are not added twice.
    fn stitch(&self, mut subtree: SelectionSet) -> SelectionSet {
        let stitch_fields = match &self.stitch_fields {
            Some(stitch_fields) => stitch_fields,
            None => return subtree,
        };

        let mut selected = HashSet::new();
        let mut required = Vec::new();
        for selection in &subtree.items {
            if let Selection::Field(field) = &selection.node {
                selected.insert(print_field(&field.node));
                if let Some(field_nodes) = stitch_fields.get(field.node.name.node.as_str()) {
                    required.extend(field_nodes.iter().cloned());
                }
            }
        }

        for field_node in required {
            if selected.insert(print_field(&field_node.node)) {
                subtree.items.push(Positioned::new(
                    Selection::Field((*field_node).clone()),
                    Pos::default(),
                ));
            }
        }
        subtree
    }
}
