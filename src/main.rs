#![forbid(unsafe_code)]

mod config;
mod options;

use anyhow::{Context, Result};
use resolvegate_handler::{ResolutionPlan, ResolveToByTransform, CONDITION_RESOLVERS};
use resolvegate_planner::print_field;
use serde_json::{json, Map, Value};
use structopt::StructOpt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use config::Config;
use options::Options;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn describe_plan(plan: &ResolutionPlan, verbose: bool) -> Result<Value> {
    let mut fields = Vec::new();
    for (type_name, field_name, resolver) in plan.resolvers.iter() {
        let condition = resolver.condition();
        let mut field = json!({
            "type": type_name.as_str(),
            "field": field_name.as_str(),
            "list": condition.field_kind.is_list(),
            "selectionSet": resolver.selection_set(),
            "sources": condition
                .resolvers
                .iter()
                .map(|spec| {
                    let args = spec.args();
                    format!(
                        "{}.{}.{}",
                        args.source_name, args.source_type_name, args.source_field_name
                    )
                })
                .collect::<Vec<_>>(),
        });
        if verbose {
            let marker = plan
                .schema
                .field(type_name, field_name)?
                .extensions
                .get(CONDITION_RESOLVERS)
                .cloned()
                .unwrap_or_default();
            field["resolvers"] = serde_json::to_value(marker)?;
        }
        fields.push(field);
    }

    let mut stitching = Map::new();
    for (type_name, field_nodes) in &plan.stitching_info.field_nodes_by_field {
        let mut type_fields = Map::new();
        for (field_name, nodes) in field_nodes {
            type_fields.insert(
                field_name.to_string(),
                nodes.iter().map(|node| print_field(&node.node)).collect(),
            );
        }
        stitching.insert(type_name.to_string(), Value::Object(type_fields));
    }

    Ok(json!({
        "version": plan.version,
        "fields": fields,
        "stitching": stitching,
    }))
}

fn main() -> Result<()> {
    let options: Options = Options::from_args();
    init_tracing();

    let config = Config::load(&options.config)?;
    let schema = config.gateway_schema()?;
    let stitching_info = config.stitching_info()?;

    let plan = ResolveToByTransform
        .transform_schema(schema, stitching_info)
        .context("Failed to compile @resolveToBy directives.")?;
    tracing::info!(
        version = plan.version,
        fields = plan.resolvers.len(),
        "Schema transformed."
    );

    println!(
        "{}",
        serde_json::to_string_pretty(&describe_plan(&plan, options.verbose)?)?
    );
    Ok(())
}
