use indexmap::IndexMap;
use resolvegate_expression::{Scope, Template};
use resolvegate_schema::{FieldKind, ValuePath};
use serde::Deserialize;
use value::ConstValue;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl Default for OrderDirection {
    fn default() -> Self {
        OrderDirection::Asc
    }
}

/// How the annotated field's type is written, as recorded on every spec.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize)]
pub enum FieldNodeType {
    NamedType,
    ListType,
}

impl FieldNodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldNodeType::NamedType => "NamedType",
            FieldNodeType::ListType => "ListType",
        }
    }
}

impl From<FieldKind> for FieldNodeType {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Single => FieldNodeType::NamedType,
            FieldKind::List => FieldNodeType::ListType,
        }
    }
}

impl From<FieldNodeType> for FieldKind {
    fn from(node_type: FieldNodeType) -> Self {
        match node_type {
            FieldNodeType::NamedType => FieldKind::Single,
            FieldNodeType::ListType => FieldKind::List,
        }
    }
}

/// Arguments of one `@resolveToBy` occurrence plus the identity of the field
/// it is attached to.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverArgs {
    pub condition: Option<String>,
    pub required_selection_set: Option<String>,
    pub source_name: String,
    pub source_type_name: String,
    pub source_field_name: String,
    pub source_selection_set: Option<String>,
    pub source_args: Option<ConstValue>,
    pub key_field: Option<String>,
    pub keys_arg: Option<String>,
    pub pubsub_topic: Option<String>,
    pub additional_args: Option<IndexMap<String, String>>,
    pub result: Option<String>,
    pub result_type: Option<String>,
    pub filter_by: Option<String>,
    pub order_by_path: Option<String>,
    #[serde(default)]
    pub order_by_direction: OrderDirection,
    pub unique_by_path: Option<String>,
    pub hoist_path: Option<String>,
    pub merge_by: Option<String>,

    pub target_type_name: String,
    pub target_field_name: String,
    pub target_field_node_type: FieldNodeType,
}

impl ResolverArgs {
    /// The selections the annotated field needs from its parent, if any.
    pub fn required_selection_set(&self) -> Option<String> {
        match (&self.required_selection_set, &self.key_field) {
            (Some(selection_set), _) => Some(selection_set.clone()),
            (None, Some(key_field)) => Some(format!("{{ {} }}", key_field)),
            (None, None) => None,
        }
    }
}

/// A tree of string templates flattened to the paths they are written to.
///
/// `{ input: { id: "{args.id}" } }` becomes a single leaf at `input.id`.
#[derive(Debug, Clone, Default)]
pub struct ArgTemplate {
    leaves: Vec<(ValuePath, Template)>,
}

impl ArgTemplate {
    pub(crate) fn push(&mut self, path: ValuePath, template: Template) {
        self.leaves.push((path, template));
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Renders every leaf and writes it into a new argument object.
    pub fn build(&self, scope: &Scope<'_>) -> ConstValue {
        let mut args = ConstValue::Object(Default::default());
        self.build_into(scope, &mut args);
        args
    }

    pub fn build_into(&self, scope: &Scope<'_>, args: &mut ConstValue) {
        for (path, template) in &self.leaves {
            path.set(args, template.render(scope));
        }
    }
}

/// Builds the arguments of a key batched call.
#[derive(Debug, Clone)]
pub struct ArgsFromKeys {
    keys_arg: ValuePath,
    additional_args: ConstValue,
}

impl ArgsFromKeys {
    pub fn new(keys_arg: ValuePath, additional_args: ConstValue) -> Self {
        Self {
            keys_arg,
            additional_args,
        }
    }

    /// Arguments shared by every key of the batch.
    #[inline]
    pub fn additional_args(&self) -> &ConstValue {
        &self.additional_args
    }

    pub fn args(&self, keys: Vec<ConstValue>) -> ConstValue {
        let mut args = ConstValue::Object(Default::default());
        self.keys_arg.set(&mut args, ConstValue::List(keys));
        if let (ConstValue::Object(args), ConstValue::Object(additional_args)) =
            (&mut args, &self.additional_args)
        {
            for (name, value) in additional_args {
                args.insert(name.clone(), value.clone());
            }
        }
        args
    }
}
