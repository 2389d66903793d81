#![forbid(unsafe_code)]

mod args;
mod batch;
mod compiler;
mod condition;
mod context;
mod error;
mod pipeline;
mod resolver;
mod transform;

pub use args::{ArgTemplate, ArgsFromKeys, FieldNodeType, OrderDirection, ResolverArgs};
pub use batch::KeyBatcher;
pub use compiler::{parse_literal, DirectiveCompiler, CONDITION_RESOLVERS, RESOLVE_TO_BY};
pub use condition::{ResolveCondition, ResolverSpec};
pub use context::{
    DelegateOptions, MemoryPubSub, PubSub, ResolveInfo, ResolverContext, Source, SourceField,
};
pub use error::{CompileError, ResolveError, ServerError};
pub use pipeline::values_from_results;
pub use resolver::{FieldResolver, ResolverMap};
pub use transform::{ResolutionPlan, ResolveToByTransform};
