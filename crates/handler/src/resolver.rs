use std::sync::Arc;

use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use indexmap::IndexMap;
use resolvegate_expression::Scope;
use value::{ConstValue, Name};

use crate::context::ResolverData;
use crate::pipeline::values_from_results;
use crate::{
    DelegateOptions, ResolveCondition, ResolveError, ResolveInfo, ResolverContext, SourceField,
};

/// Resolves a field by delegating to the first resolver of its chain whose
/// condition holds.
#[derive(Debug, Clone)]
pub struct FieldResolver {
    condition: Arc<ResolveCondition>,
    selection_set: Option<String>,
}

impl FieldResolver {
    pub fn new(condition: ResolveCondition) -> Result<Self, resolvegate_planner::PlanError> {
        let selection_set = condition.required_selection_set()?;
        Ok(Self {
            condition: Arc::new(condition),
            selection_set,
        })
    }

    #[inline]
    pub fn condition(&self) -> &ResolveCondition {
        &self.condition
    }

    /// The selections this field requires from its parent object.
    #[inline]
    pub fn selection_set(&self) -> Option<&str> {
        self.selection_set.as_deref()
    }

    pub async fn resolve(
        &self,
        root: &ConstValue,
        args: &ConstValue,
        ctx: &ResolverContext,
        info: &ResolveInfo,
    ) -> Result<ConstValue, ResolveError> {
        let info_value = info.to_value();
        let data = ResolverData {
            root,
            args,
            context: ctx.context_value(),
            info: &info_value,
            env: ctx.env_value(),
        };
        let scope = data.scope();

        for (idx, spec) in self.condition.resolvers.iter().enumerate() {
            if !spec.condition_matches(&scope)? {
                continue;
            }

            let spec_args = spec.args();
            let source_field = self.source_field(
                ctx,
                &spec_args.source_name,
                &spec_args.source_type_name,
                &spec_args.source_field_name,
            )?;

            tracing::debug!(
                type_name = %self.condition.type_name,
                field_name = %self.condition.field_name,
                resolver = idx,
                source = %spec_args.source_name,
                "Resolver selected."
            );

            if spec.is_subscription_driven() {
                return Ok(values_from_results(spec, root.clone(), &scope)?);
            }

            let factory = spec.selection_set_factory(&info.schema, &info.stitching_info)?;
            let selection_set = factory.build(info.selection_set.clone());

            let options = match spec.keyed_args(root, &scope) {
                Some((key, args_from_keys)) => DelegateOptions {
                    root: root.clone(),
                    args: ConstValue::Object(Default::default()),
                    key: Some(key),
                    args_from_keys: Some(args_from_keys),
                    selection_set,
                    info: info.clone(),
                },
                None => DelegateOptions {
                    root: root.clone(),
                    args: spec.source_args(&scope),
                    key: None,
                    args_from_keys: None,
                    selection_set,
                    info: info.clone(),
                },
            };

            let result = source_field.call(options).await?;
            return Ok(values_from_results(spec, result, &scope)?);
        }

        Ok(if self.condition.field_kind.is_list() {
            ConstValue::List(Vec::new())
        } else {
            ConstValue::Null
        })
    }

    /// Subscribes to the topic of the first resolver whose condition holds. Events
    /// failing its filter are skipped.
    pub fn subscribe(
        &self,
        root: &ConstValue,
        args: &ConstValue,
        ctx: &ResolverContext,
        info: &ResolveInfo,
    ) -> Result<BoxStream<'static, Result<ConstValue, ResolveError>>, ResolveError> {
        let info_value = info.to_value();
        let data = ResolverData {
            root,
            args,
            context: ctx.context_value(),
            info: &info_value,
            env: ctx.env_value(),
        };
        let scope = data.scope();

        for spec in &self.condition.resolvers {
            if !spec.condition_matches(&scope)? {
                continue;
            }

            let pubsub = ctx.get_pubsub().ok_or(ResolveError::MissingPubSub)?;
            let topic = spec
                .topic(&scope)
                .ok_or_else(|| ResolveError::MissingTopic {
                    type_name: self.condition.type_name.to_string(),
                    field_name: self.condition.field_name.to_string(),
                })?;

            tracing::debug!(
                type_name = %self.condition.type_name,
                field_name = %self.condition.field_name,
                topic = %topic,
                "Subscribe to topic."
            );

            let mut events = pubsub.subscribe(&topic);
            let spec = spec.clone();
            let args = args.clone();
            let context = ctx.context_value().clone();
            let env = ctx.env_value().clone();
            let info = info_value.clone();

            return Ok(Box::pin(async_stream::stream! {
                while let Some(event) = events.next().await {
                    let matched = spec.filter_matches(
                        &Scope::new()
                            .with("result", &event)
                            .with("root", &event)
                            .with("args", &args)
                            .with("context", &context)
                            .with("info", &info)
                            .with("env", &env),
                    );
                    match matched {
                        Ok(true) => yield Ok(event),
                        Ok(false) => {}
                        Err(err) => yield Err(ResolveError::from(err)),
                    }
                }
            }));
        }

        Ok(stream::empty().boxed())
    }

    fn source_field<'a>(
        &self,
        ctx: &'a ResolverContext,
        source_name: &str,
        type_name: &str,
        field_name: &str,
    ) -> Result<&'a Arc<dyn SourceField>, ResolveError> {
        let path = vec![self.condition.field_name.to_string()];
        let source = ctx
            .get_source(source_name)
            .ok_or_else(|| ResolveError::NotFound {
                message: format!("No source found named \"{}\"", source_name),
                path: path.clone(),
            })?;
        let root_type = source
            .root_type(type_name)
            .ok_or_else(|| ResolveError::NotFound {
                message: format!(
                    "No root type found named \"{}\" exists in the source {}\nIt should be one of the following; {}",
                    type_name,
                    source_name,
                    source.root_type_names().collect::<Vec<_>>().join(","),
                ),
                path: path.clone(),
            })?;
        root_type
            .get(field_name)
            .ok_or_else(|| ResolveError::NotFound {
                message: format!(
                    "No field named \"{}\" exists in the type {} from the source {}",
                    field_name, type_name, source_name
                ),
                path,
            })
    }
}

/// Resolvers by type name and field name.
#[derive(Debug, Clone, Default)]
pub struct ResolverMap {
    types: IndexMap<Name, IndexMap<Name, FieldResolver>>,
}

impl ResolverMap {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn insert(&mut self, resolver: FieldResolver) {
        let condition = resolver.condition();
        let (type_name, field_name) = (condition.type_name.clone(), condition.field_name.clone());
        self.types
            .entry(type_name)
            .or_default()
            .insert(field_name, resolver);
    }

    /// Merges `other` into this map; its resolvers replace existing ones for
    /// the same field.
    pub fn merge(&mut self, other: ResolverMap) {
        for (type_name, fields) in other.types {
            self.types.entry(type_name).or_default().extend(fields);
        }
    }

    #[inline]
    pub fn get(&self, type_name: &str, field_name: &str) -> Option<&FieldResolver> {
        self.types.get(type_name)?.get(field_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Name, &FieldResolver)> {
        self.types.iter().flat_map(|(type_name, fields)| {
            fields
                .iter()
                .map(move |(field_name, resolver)| (type_name, field_name, resolver))
        })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn len(&self) -> usize {
        self.types.values().map(IndexMap::len).sum()
    }
}
