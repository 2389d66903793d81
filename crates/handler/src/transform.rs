use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::stream::BoxStream;
use parser::types::SelectionSet;
use resolvegate_planner::{complete_stitching_info, FieldSelectionSet, StitchingInfo};
use resolvegate_schema::ComposedSchema;
use value::{ConstValue, Name};

use crate::{
    CompileError, DirectiveCompiler, FieldResolver, ResolveError, ResolveInfo, ResolverContext,
    ResolverMap,
};

static PLAN_VERSION: AtomicU64 = AtomicU64::new(0);

/// Compiles the `@resolveToBy` directives of a stitched schema.
#[derive(Debug, Default, Copy, Clone)]
pub struct ResolveToByTransform;

impl ResolveToByTransform {
    /// Builds the resolution plan of `schema`.
    ///
    /// Without stitching info, or when no field carries the directive, the
    /// plan holds the schema as given and no resolvers.
    pub fn transform_schema(
        &self,
        mut schema: ComposedSchema,
        stitching_info: Option<StitchingInfo>,
    ) -> Result<ResolutionPlan, CompileError> {
        tracing::info_span!("transform_schema").in_scope(|| {
            let version = PLAN_VERSION.fetch_add(1, Ordering::Relaxed) + 1;

            let stitching_info = match stitching_info {
                Some(stitching_info) => stitching_info,
                None => {
                    tracing::debug!("No stitching info, schema left unchanged.");
                    return Ok(ResolutionPlan::new(
                        version,
                        schema,
                        ResolverMap::new(),
                        StitchingInfo::default(),
                    ));
                }
            };

            let conditions = DirectiveCompiler::default().compile(&mut schema)?;
            if conditions.is_empty() {
                return Ok(ResolutionPlan::new(
                    version,
                    schema,
                    ResolverMap::new(),
                    stitching_info,
                ));
            }

            let mut resolvers = ResolverMap::new();
            for condition in conditions {
                let mut field_resolvers = ResolverMap::new();
                field_resolvers.insert(FieldResolver::new(condition)?);
                resolvers.merge(field_resolvers);
            }

            let selection_sets = resolvers
                .iter()
                .filter_map(|(type_name, field_name, resolver)| {
                    resolver.selection_set().map(|selection_set| {
                        (
                            type_name.clone(),
                            field_name.clone(),
                            FieldSelectionSet::Static(selection_set.to_string()),
                        )
                    })
                })
                .collect::<Vec<_>>();
            let stitching_info = complete_stitching_info(
                stitching_info,
                selection_sets.iter().map(|(type_name, field_name, selection_set)| {
                    (type_name.as_str(), field_name.as_str(), selection_set)
                }),
                &schema,
            )?;

            tracing::info!(version, fields = resolvers.len(), "Resolution plan built.");
            Ok(ResolutionPlan::new(
                version,
                schema,
                resolvers,
                stitching_info,
            ))
        })
    }
}

/// The outcome of a schema transform. Immutable once built.
#[derive(Debug, Clone)]
pub struct ResolutionPlan {
    /// Increases with every plan built by this process.
    pub version: u64,
    pub schema: Arc<ComposedSchema>,
    pub resolvers: Arc<ResolverMap>,
    pub stitching_info: Arc<StitchingInfo>,
}

impl ResolutionPlan {
    fn new(
        version: u64,
        schema: ComposedSchema,
        resolvers: ResolverMap,
        stitching_info: StitchingInfo,
    ) -> Self {
        Self {
            version,
            schema: Arc::new(schema),
            resolvers: Arc::new(resolvers),
            stitching_info: Arc::new(stitching_info),
        }
    }

    pub fn resolve_info(
        &self,
        type_name: &str,
        field_name: &str,
        selection_set: SelectionSet,
    ) -> ResolveInfo {
        ResolveInfo {
            parent_type: Name::new(type_name),
            field_name: Name::new(field_name),
            selection_set,
            schema: self.schema.clone(),
            stitching_info: self.stitching_info.clone(),
        }
    }

    fn resolver(&self, type_name: &str, field_name: &str) -> Result<&FieldResolver, ResolveError> {
        self.resolvers
            .get(type_name, field_name)
            .ok_or_else(|| ResolveError::NoResolver {
                type_name: type_name.to_string(),
                field_name: field_name.to_string(),
            })
    }

    /// Resolves `type_name.field_name` for the object `root`.
    pub async fn resolve(
        &self,
        type_name: &str,
        field_name: &str,
        root: &ConstValue,
        args: &ConstValue,
        selection_set: SelectionSet,
        ctx: &ResolverContext,
    ) -> Result<ConstValue, ResolveError> {
        let resolver = self.resolver(type_name, field_name)?;
        let info = self.resolve_info(type_name, field_name, selection_set);
        resolver.resolve(root, args, ctx, &info).await
    }

    pub fn subscribe(
        &self,
        type_name: &str,
        field_name: &str,
        root: &ConstValue,
        args: &ConstValue,
        selection_set: SelectionSet,
        ctx: &ResolverContext,
    ) -> Result<BoxStream<'static, Result<ConstValue, ResolveError>>, ResolveError> {
        let resolver = self.resolver(type_name, field_name)?;
        let info = self.resolve_info(type_name, field_name, selection_set);
        resolver.subscribe(root, args, ctx, &info)
    }
}
