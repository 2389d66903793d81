use std::cmp::Ordering;

use value::ConstValue;

pub trait ValueExt {
    /// Truthiness as the directive expressions see it.
    fn is_truthy(&self) -> bool;

    /// Merges `other` into `self`: objects key by key, lists by concatenation,
    /// anything else is replaced.
    fn deep_merge(&mut self, other: ConstValue);

    /// Strips nulls, empty strings, empty lists and empty objects below the top level.
    fn deep_clean(self) -> ConstValue;

    /// String form used as a grouping key. `None` for null.
    fn to_key_string(&self) -> Option<String>;

    /// Total order used for sorting; nulls sort last.
    fn compare(&self, other: &ConstValue) -> Ordering;

    fn as_f64(&self) -> Option<f64>;
}

impl ValueExt for ConstValue {
    fn is_truthy(&self) -> bool {
        match self {
            ConstValue::Null => false,
            ConstValue::Boolean(b) => *b,
            ConstValue::Number(n) => n.as_f64().map(|n| n != 0.0 && !n.is_nan()).unwrap_or(true),
            ConstValue::String(s) => !s.is_empty(),
            ConstValue::Binary(bytes) => !bytes.is_empty(),
            ConstValue::Enum(_) | ConstValue::List(_) | ConstValue::Object(_) => true,
        }
    }

    fn deep_merge(&mut self, other: ConstValue) {
        match (self, other) {
            (ConstValue::Object(object), ConstValue::Object(other_object)) => {
                for (key, value) in other_object {
                    match object.get_mut(&key) {
                        Some(target) => target.deep_merge(value),
                        None => {
                            object.insert(key, value);
                        }
                    }
                }
            }
            (ConstValue::List(list), ConstValue::List(other_list)) => list.extend(other_list),
            (target, value) => *target = value,
        }
    }

    fn deep_clean(self) -> ConstValue {
        fn clean(value: ConstValue) -> Option<ConstValue> {
            match value {
                ConstValue::Null => None,
                ConstValue::String(s) if s.is_empty() => None,
                ConstValue::Number(n) if n.as_f64().map(f64::is_nan).unwrap_or(false) => None,
                ConstValue::List(list) => {
                    let list: Vec<_> = list.into_iter().filter_map(clean).collect();
                    (!list.is_empty()).then_some(ConstValue::List(list))
                }
                ConstValue::Object(object) => {
                    let object: indexmap::IndexMap<_, _> = object
                        .into_iter()
                        .filter_map(|(key, value)| clean(value).map(|value| (key, value)))
                        .collect();
                    (!object.is_empty()).then_some(ConstValue::Object(object))
                }
                value => Some(value),
            }
        }

        match self {
            ConstValue::List(list) => {
                ConstValue::List(list.into_iter().filter_map(clean).collect())
            }
            ConstValue::Object(object) => ConstValue::Object(
                object
                    .into_iter()
                    .filter_map(|(key, value)| clean(value).map(|value| (key, value)))
                    .collect(),
            ),
            value => value,
        }
    }

    fn to_key_string(&self) -> Option<String> {
        match self {
            ConstValue::Null => None,
            ConstValue::String(s) => Some(s.clone()),
            ConstValue::Number(n) => Some(n.to_string()),
            ConstValue::Boolean(b) => Some(b.to_string()),
            ConstValue::Enum(name) => Some(name.to_string()),
            value => Some(value.to_string()),
        }
    }

    fn compare(&self, other: &ConstValue) -> Ordering {
        match (self, other) {
            (ConstValue::Null, ConstValue::Null) => Ordering::Equal,
            (ConstValue::Null, _) => Ordering::Greater,
            (_, ConstValue::Null) => Ordering::Less,
            (ConstValue::Number(a), ConstValue::Number(b)) => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal),
            (ConstValue::String(a), ConstValue::String(b)) => a.cmp(b),
            (ConstValue::Boolean(a), ConstValue::Boolean(b)) => a.cmp(b),
            (ConstValue::Enum(a), ConstValue::Enum(b)) => a.as_str().cmp(b.as_str()),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                _ => a.to_string().cmp(&b.to_string()),
            },
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            ConstValue::Number(n) => n.as_f64(),
            ConstValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            ConstValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}
