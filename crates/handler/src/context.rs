use std::sync::Arc;

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use indexmap::IndexMap;
use parser::types::SelectionSet;
use resolvegate_expression::Scope;
use resolvegate_planner::StitchingInfo;
use resolvegate_schema::ComposedSchema;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use value::{ConstValue, Name};

use crate::args::ArgsFromKeys;

/// A field of a data source, called to produce a delegated value.
#[async_trait::async_trait]
pub trait SourceField: Send + Sync {
    async fn call(&self, options: DelegateOptions) -> anyhow::Result<ConstValue>;
}

/// Everything a source field receives for one delegated call.
#[derive(Debug, Clone)]
pub struct DelegateOptions {
    pub root: ConstValue,

    /// Arguments built from `sourceArgs`. Empty for key batched calls.
    pub args: ConstValue,

    /// The key of `root` for key batched calls.
    pub key: Option<ConstValue>,

    /// Builds the arguments of the batched call from the collected keys.
    pub args_from_keys: Option<ArgsFromKeys>,

    /// The selections to request from the source.
    pub selection_set: SelectionSet,

    pub info: ResolveInfo,
}

/// A named data source: root type name to field name to callable.
#[derive(Default, Clone)]
pub struct Source {
    root_types: IndexMap<String, IndexMap<String, Arc<dyn SourceField>>>,
}

impl Source {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn field(
        mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        field: impl SourceField + 'static,
    ) -> Self {
        self.root_types
            .entry(type_name.into())
            .or_default()
            .insert(field_name.into(), Arc::new(field));
        self
    }

    #[inline]
    pub fn root_type_names(&self) -> impl Iterator<Item = &str> {
        self.root_types.keys().map(String::as_str)
    }

    pub fn root_type(&self, type_name: &str) -> Option<&IndexMap<String, Arc<dyn SourceField>>> {
        self.root_types.get(type_name)
    }
}

/// Publish/subscribe facility used by subscription fields.
pub trait PubSub: Send + Sync {
    fn subscribe(&self, topic: &str) -> BoxStream<'static, ConstValue>;
}

/// An in-process [`PubSub`] backed by broadcast channels.
pub struct MemoryPubSub {
    capacity: usize,
    topics: std::sync::Mutex<IndexMap<String, broadcast::Sender<ConstValue>>>,
}

impl MemoryPubSub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            topics: Default::default(),
        }
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<ConstValue> {
        let mut topics = match self.topics.lock() {
            Ok(topics) => topics,
            Err(poisoned) => poisoned.into_inner(),
        };
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Publishes an event and returns the number of subscribers reached.
    pub fn publish(&self, topic: &str, event: ConstValue) -> usize {
        self.sender(topic).send(event).unwrap_or_default()
    }
}

impl PubSub for MemoryPubSub {
    fn subscribe(&self, topic: &str) -> BoxStream<'static, ConstValue> {
        BroadcastStream::new(self.sender(topic).subscribe())
            .filter_map(|event| async move {
                match event {
                    Ok(event) => Some(event),
                    Err(err) => {
                        tracing::warn!(error = %err, "Subscriber lagged behind.");
                        None
                    }
                }
            })
            .boxed()
    }
}

/// Per-request state handed to resolvers.
#[derive(Clone)]
pub struct ResolverContext {
    sources: IndexMap<String, Source>,
    pubsub: Option<Arc<dyn PubSub>>,
    value: ConstValue,
    env: ConstValue,
}

impl Default for ResolverContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverContext {
    /// Creates a context with a snapshot of the process environment as `env`.
    pub fn new() -> Self {
        Self {
            sources: Default::default(),
            pubsub: None,
            value: ConstValue::Object(Default::default()),
            env: ConstValue::Object(
                std::env::vars()
                    .map(|(name, value)| (Name::new(name), ConstValue::String(value)))
                    .collect(),
            ),
        }
    }

    pub fn source(mut self, name: impl Into<String>, source: Source) -> Self {
        self.sources.insert(name.into(), source);
        self
    }

    pub fn pubsub(mut self, pubsub: Arc<dyn PubSub>) -> Self {
        self.pubsub = Some(pubsub);
        self
    }

    /// The value expressions see as `context`.
    pub fn value(mut self, value: ConstValue) -> Self {
        self.value = value;
        self
    }

    pub fn env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.env = ConstValue::Object(
            vars.into_iter()
                .map(|(name, value)| (Name::new(name), ConstValue::String(value.into())))
                .collect(),
        );
        self
    }

    #[inline]
    pub fn get_source(&self, name: &str) -> Option<&Source> {
        self.sources.get(name)
    }

    #[inline]
    pub fn get_pubsub(&self) -> Option<&Arc<dyn PubSub>> {
        self.pubsub.as_ref()
    }

    #[inline]
    pub fn context_value(&self) -> &ConstValue {
        &self.value
    }

    #[inline]
    pub fn env_value(&self) -> &ConstValue {
        &self.env
    }
}

/// Information about the field being resolved.
#[derive(Debug, Clone)]
pub struct ResolveInfo {
    pub parent_type: Name,
    pub field_name: Name,

    /// Selections requested on the field.
    pub selection_set: SelectionSet,

    pub schema: Arc<ComposedSchema>,
    pub stitching_info: Arc<StitchingInfo>,
}

impl ResolveInfo {
    /// The form expressions and templates see as `info`.
    pub fn to_value(&self) -> ConstValue {
        let mut info = IndexMap::new();
        info.insert(
            Name::new("parentType"),
            ConstValue::String(self.parent_type.to_string()),
        );
        info.insert(
            Name::new("fieldName"),
            ConstValue::String(self.field_name.to_string()),
        );
        info.insert(
            Name::new("path"),
            ConstValue::List(vec![ConstValue::String(self.field_name.to_string())]),
        );
        ConstValue::Object(info)
    }
}

/// The variables of one resolver call.
pub(crate) struct ResolverData<'a> {
    pub root: &'a ConstValue,
    pub args: &'a ConstValue,
    pub context: &'a ConstValue,
    pub info: &'a ConstValue,
    pub env: &'a ConstValue,
}

impl<'a> ResolverData<'a> {
    pub fn scope(&self) -> Scope<'a> {
        Scope::new()
            .with("root", self.root)
            .with("args", self.args)
            .with("context", self.context)
            .with("info", self.info)
            .with("env", self.env)
    }
}
