use std::collections::HashSet;

use indexmap::IndexMap;
use resolvegate_expression::{ExprError, Scope};
use resolvegate_schema::{ValueExt, ValuePath};
use value::ConstValue;

use crate::args::OrderDirection;
use crate::ResolverSpec;

static NULL: ConstValue = ConstValue::Null;

/// Shapes the raw result of a delegated call into the value of the annotated
/// field.
///
/// The steps run in a fixed order: path extraction, filtering, ordering,
/// de-duplication, grouping, hoisting and finally cardinality coercion.
pub fn values_from_results(
    spec: &ResolverSpec,
    result: ConstValue,
    scope: &Scope<'_>,
) -> Result<ConstValue, ExprError> {
    if matches!(result, ConstValue::Null) {
        return Ok(result);
    }

    let mut result = match &spec.result {
        Some(path) => extract(path, result),
        None => result,
    };

    if spec.has_filter() {
        result = match result {
            ConstValue::List(items) => {
                let mut kept = Vec::with_capacity(items.len());
                for item in items {
                    if spec.filter_matches(&scope.clone().with("result", &item))? {
                        kept.push(item);
                    }
                }
                ConstValue::List(kept)
            }
            value => {
                if !spec.filter_matches(&scope.clone().with("result", &value))? {
                    return Ok(empty(spec));
                }
                value
            }
        };
    }

    if let ConstValue::List(mut items) = result {
        if let Some(path) = &spec.order_by {
            order_by(&mut items, path, spec.order_direction());
        }
        if let Some(path) = &spec.unique_by {
            items = unique_by(items, path);
        }
        if let Some(path) = &spec.merge_by {
            items = merge_by(items, path);
        }
        result = ConstValue::List(items);
    }

    if let Some(path) = &spec.hoist {
        result = path.get(&result).cloned().unwrap_or_default();
    }

    Ok(coerce(spec, result))
}

/// Extracts `path` from each element of a list unless the path itself starts
/// with an index.
fn extract(path: &ValuePath, value: ConstValue) -> ConstValue {
    match value {
        ConstValue::List(items) if !path.first_is_index() => {
            ConstValue::List(items.into_iter().map(|item| extract(path, item)).collect())
        }
        value => path.get(&value).cloned().unwrap_or_default(),
    }
}

fn empty(spec: &ResolverSpec) -> ConstValue {
    if spec.target_kind().is_list() {
        ConstValue::List(Vec::new())
    } else {
        ConstValue::Null
    }
}

fn order_by(items: &mut [ConstValue], path: &ValuePath, direction: OrderDirection) {
    items.sort_by(|a, b| {
        let a = path.get(a).unwrap_or(&NULL);
        let b = path.get(b).unwrap_or(&NULL);
        match direction {
            OrderDirection::Asc => a.compare(b),
            OrderDirection::Desc => b.compare(a),
        }
    });
}

fn unique_by(items: Vec<ConstValue>, path: &ValuePath) -> Vec<ConstValue> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let key = path.get(item).map(ToString::to_string).unwrap_or_default();
            seen.insert(key)
        })
        .collect()
}

/// Groups elements by the key at `path`. Later elements of a group are
/// cleaned and deep merged into the first one; elements without a key are
/// dropped.
fn merge_by(items: Vec<ConstValue>, path: &ValuePath) -> Vec<ConstValue> {
    let mut groups: IndexMap<String, ConstValue> = IndexMap::new();
    for item in items {
        let key = match path.get(&item).and_then(ValueExt::to_key_string) {
            Some(key) if !key.is_empty() => key,
            _ => continue,
        };
        match groups.get_mut(&key) {
            Some(group) => group.deep_merge(item.deep_clean()),
            None => {
                groups.insert(key, item);
            }
        }
    }
    groups.into_values().collect()
}

fn coerce(spec: &ResolverSpec, value: ConstValue) -> ConstValue {
    match (spec.target_kind().is_list(), value) {
        (true, ConstValue::List(items)) => ConstValue::List(items),
        (true, value) => ConstValue::List(vec![value]),
        (false, ConstValue::List(items)) => items.into_iter().next().unwrap_or_default(),
        (false, value) => value,
    }
}
