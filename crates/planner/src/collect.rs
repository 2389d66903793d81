use std::collections::HashMap;

use indexmap::IndexMap;
use parser::types::{Directive, Field, FragmentDefinition, Selection, SelectionSet};
use parser::Positioned;
use resolvegate_schema::{ComposedSchema, MetaType};
use value::{Name, Value};

pub type Fragments = HashMap<Name, Positioned<FragmentDefinition>>;

/// Flattens `selection_set` into its concrete field nodes for `parent_type`,
/// grouped by response key. Fragments whose type condition does not apply are
/// dropped, as are selections excluded by literal `@skip`/`@include`.
pub fn collect_fields(
    schema: &ComposedSchema,
    fragments: &Fragments,
    parent_type: &MetaType,
    selection_set: &SelectionSet,
) -> IndexMap<Name, Vec<Positioned<Field>>> {
    let mut fields = IndexMap::new();
    let mut visited_fragments = Vec::new();
    collect_into(
        schema,
        fragments,
        parent_type,
        selection_set,
        &mut fields,
        &mut visited_fragments,
    );
    fields
}

fn collect_into<'a>(
    schema: &ComposedSchema,
    fragments: &'a Fragments,
    parent_type: &MetaType,
    selection_set: &'a SelectionSet,
    fields: &mut IndexMap<Name, Vec<Positioned<Field>>>,
    visited_fragments: &mut Vec<&'a str>,
) {
    for selection in &selection_set.items {
        if !should_include(selection.node.directives()) {
            continue;
        }

        match &selection.node {
            Selection::Field(field) => {
                fields
                    .entry(field.node.response_key().node.clone())
                    .or_insert_with(Vec::new)
                    .push(field.clone());
            }
            Selection::InlineFragment(fragment) => {
                let applies = match &fragment.node.type_condition {
                    Some(type_condition) => does_fragment_condition_match(
                        schema,
                        &type_condition.node.on.node,
                        parent_type,
                    ),
                    None => true,
                };
                if applies {
                    collect_into(
                        schema,
                        fragments,
                        parent_type,
                        &fragment.node.selection_set.node,
                        fields,
                        visited_fragments,
                    );
                }
            }
            Selection::FragmentSpread(spread) => {
                let name = spread.node.fragment_name.node.as_str();
                if visited_fragments.contains(&name) {
                    continue;
                }
                let fragment = match fragments.get(name) {
                    Some(fragment) => fragment,
                    None => continue,
                };
                visited_fragments.push(name);
                if does_fragment_condition_match(
                    schema,
                    &fragment.node.type_condition.node.on.node,
                    parent_type,
                ) {
                    collect_into(
                        schema,
                        fragments,
                        parent_type,
                        &fragment.node.selection_set.node,
                        fields,
                        visited_fragments,
                    );
                }
            }
        }
    }
}

fn does_fragment_condition_match(
    schema: &ComposedSchema,
    type_condition: &str,
    parent_type: &MetaType,
) -> bool {
    if type_condition == parent_type.name.as_str() {
        return true;
    }
    match schema.type_by_name(type_condition) {
        Some(condition_type) if condition_type.is_abstract() => {
            condition_type.is_possible_type(&parent_type.name)
                || schema.is_sub_type(condition_type, parent_type)
        }
        _ => false,
    }
}

fn should_include(directives: &[Positioned<Directive>]) -> bool {
    for directive in directives {
        let condition = directive
            .node
            .get_argument("if")
            .map(|value| matches!(value.node, Value::Boolean(true)));
        match (directive.node.name.node.as_str(), condition) {
            ("skip", Some(true)) | ("include", Some(false)) => return false,
            _ => {}
        }
    }
    true
}
