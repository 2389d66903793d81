use std::sync::Arc;

use once_cell::sync::OnceCell;
use resolvegate_expression::{ExprError, Expression, Scope, Template};
use resolvegate_planner::{DelegationTarget, PlanError, SelectionSetFactory, StitchingInfo};
use resolvegate_schema::{ComposedSchema, FieldKind, ValuePath};
use value::{ConstValue, Name};

use crate::args::{ArgTemplate, ArgsFromKeys, OrderDirection, ResolverArgs};
use crate::CompileError;

/// A field carrying one or more `@resolveToBy` directives.
#[derive(Debug, Clone)]
pub struct ResolveCondition {
    pub type_name: Name,
    pub field_name: Name,
    pub field_kind: FieldKind,
    pub resolvers: Vec<Arc<ResolverSpec>>,
}

impl ResolveCondition {
    /// Union of the selections every resolver of the chain requires.
    pub fn required_selection_set(&self) -> Result<Option<String>, PlanError> {
        let mut required = None;
        for spec in &self.resolvers {
            let selection_set = match spec.args.required_selection_set() {
                Some(selection_set) => resolvegate_planner::parse_selection_set(&selection_set)?,
                None => continue,
            };
            required = Some(match required {
                Some(required) => {
                    resolvegate_planner::merge_selection_sets(&required, &selection_set)
                }
                None => selection_set,
            });
        }
        Ok(required
            .as_ref()
            .map(resolvegate_planner::print_selection_set))
    }
}

/// One compiled `@resolveToBy` occurrence.
///
/// Expressions, templates and paths are parsed when the directive is
/// compiled. The selection-set factory is built on first resolution and
/// shared by every later request; it only depends on the plan, so a
/// concurrent first use would build an identical value.
#[derive(Debug)]
pub struct ResolverSpec {
    args: ResolverArgs,
    condition: Option<Expression>,
    filter_by: Option<Expression>,
    pubsub_topic: Option<Template>,
    source_args: ArgTemplate,
    additional_args: ArgTemplate,
    keys_arg: Option<ValuePath>,
    key_field: Option<ValuePath>,
    pub(crate) result: Option<ValuePath>,
    pub(crate) order_by: Option<ValuePath>,
    pub(crate) unique_by: Option<ValuePath>,
    pub(crate) merge_by: Option<ValuePath>,
    pub(crate) hoist: Option<ValuePath>,
    selection_set_factory: OnceCell<SelectionSetFactory>,
}

impl ResolverSpec {
    pub fn compile(args: ResolverArgs) -> Result<Self, CompileError> {
        let expression = |source: &Option<String>| {
            source
                .as_deref()
                .map(|source| {
                    Expression::parse(source).map_err(|err| expression_error(&args, source, err))
                })
                .transpose()
        };
        let condition = expression(&args.condition)?;
        let filter_by = expression(&args.filter_by)?;

        let pubsub_topic = args
            .pubsub_topic
            .as_deref()
            .map(|source| {
                Template::parse(source).map_err(|err| expression_error(&args, source, err))
            })
            .transpose()?;

        let mut source_args = ArgTemplate::default();
        match &args.source_args {
            None | Some(ConstValue::Null) => {}
            Some(ConstValue::Object(object)) => {
                for (name, value) in object {
                    flatten_arg_template(&args, value, name.to_string(), &mut source_args)?;
                }
            }
            Some(value) => {
                return Err(CompileError::InvalidSourceArg {
                    type_name: args.target_type_name.clone(),
                    field_name: args.target_field_name.clone(),
                    path: String::new(),
                    value: value.clone(),
                })
            }
        }

        let mut additional_args = ArgTemplate::default();
        for (path, source) in args.additional_args.iter().flatten() {
            let template =
                Template::parse(source).map_err(|err| expression_error(&args, source, err))?;
            additional_args.push(ValuePath::parse(path), template);
        }

        let path = |path: &Option<String>| path.as_deref().map(ValuePath::parse);

        Ok(Self {
            condition,
            filter_by,
            pubsub_topic,
            source_args,
            additional_args,
            keys_arg: path(&args.keys_arg),
            key_field: path(&args.key_field),
            result: path(&args.result),
            order_by: path(&args.order_by_path),
            unique_by: path(&args.unique_by_path),
            merge_by: path(&args.merge_by),
            hoist: path(&args.hoist_path),
            selection_set_factory: OnceCell::new(),
            args,
        })
    }

    #[inline]
    pub fn args(&self) -> &ResolverArgs {
        &self.args
    }

    #[inline]
    pub fn target_kind(&self) -> FieldKind {
        self.args.target_field_node_type.into()
    }

    #[inline]
    pub fn order_direction(&self) -> OrderDirection {
        self.args.order_by_direction
    }

    #[inline]
    pub fn is_subscription_driven(&self) -> bool {
        self.pubsub_topic.is_some()
    }

    /// A resolver without a condition always applies.
    pub fn condition_matches(&self, scope: &Scope<'_>) -> Result<bool, ExprError> {
        match &self.condition {
            Some(condition) => condition.evaluate_bool(scope),
            None => Ok(true),
        }
    }

    pub fn has_filter(&self) -> bool {
        self.filter_by.is_some()
    }

    /// A resolver without a filter keeps every value.
    pub fn filter_matches(&self, scope: &Scope<'_>) -> Result<bool, ExprError> {
        match &self.filter_by {
            Some(filter_by) => filter_by.evaluate_bool(scope),
            None => Ok(true),
        }
    }

    pub fn topic(&self, scope: &Scope<'_>) -> Option<String> {
        self.pubsub_topic
            .as_ref()
            .map(|template| template.render_string(scope))
    }

    /// Arguments for a direct call, built from `sourceArgs`.
    pub fn source_args(&self, scope: &Scope<'_>) -> ConstValue {
        self.source_args.build(scope)
    }

    /// The key of `root` and the argument builder for a key batched call, when
    /// `keysArg` is set.
    pub fn keyed_args(
        &self,
        root: &ConstValue,
        scope: &Scope<'_>,
    ) -> Option<(ConstValue, ArgsFromKeys)> {
        let keys_arg = self.keys_arg.clone()?;
        let key = self
            .key_field
            .as_ref()
            .and_then(|key_field| key_field.get(root))
            .cloned()
            .unwrap_or_default();
        Some((key, ArgsFromKeys::new(keys_arg, self.additional_args.build(scope))))
    }

    pub fn selection_set_factory(
        &self,
        schema: &ComposedSchema,
        stitching_info: &StitchingInfo,
    ) -> Result<&SelectionSetFactory, PlanError> {
        self.selection_set_factory.get_or_try_init(|| {
            SelectionSetFactory::new(
                schema,
                stitching_info,
                DelegationTarget {
                    source_type_name: &self.args.source_type_name,
                    source_field_name: &self.args.source_field_name,
                    source_selection_set: self.args.source_selection_set.as_deref(),
                    result: self.result.as_ref(),
                    result_type: self.args.result_type.as_deref(),
                    target_type_name: &self.args.target_type_name,
                    target_field_name: &self.args.target_field_name,
                },
            )
        })
    }
}

fn flatten_arg_template(
    args: &ResolverArgs,
    value: &ConstValue,
    path: String,
    output: &mut ArgTemplate,
) -> Result<(), CompileError> {
    match value {
        ConstValue::String(source) => {
            let template =
                Template::parse(source).map_err(|err| expression_error(args, source, err))?;
            output.push(ValuePath::parse(&path), template);
            Ok(())
        }
        ConstValue::Object(object) => {
            for (name, value) in object {
                flatten_arg_template(args, value, format!("{}.{}", path, name), output)?;
            }
            Ok(())
        }
        value => Err(CompileError::InvalidSourceArg {
            type_name: args.target_type_name.clone(),
            field_name: args.target_field_name.clone(),
            path,
            value: value.clone(),
        }),
    }
}

fn expression_error(args: &ResolverArgs, source: &str, err: ExprError) -> CompileError {
    CompileError::Expression {
        type_name: args.target_type_name.clone(),
        field_name: args.target_field_name.clone(),
        source_text: source.to_string(),
        err,
    }
}
