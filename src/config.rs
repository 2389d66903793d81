use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use resolvegate_planner::{parse_selection_set, MergedTypeInfo, StitchingInfo, Subschema};
use resolvegate_schema::ComposedSchema;
use serde::Deserialize;
use value::Name;

#[derive(Debug, Deserialize, Clone)]
pub struct SubschemaConfig {
    pub name: String,
    pub schema: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct MergedTypeConfig {
    /// Subschema name to the selections it needs for the type.
    #[serde(default)]
    pub selection_sets: IndexMap<String, String>,

    /// Subschema name to field name to the selections it needs for the field.
    #[serde(default)]
    pub field_selection_sets: IndexMap<String, IndexMap<String, String>>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    /// The stitched gateway schema.
    pub schema: String,

    #[serde(default)]
    pub subschemas: Vec<SubschemaConfig>,

    #[serde(default)]
    pub merged_types: IndexMap<String, MergedTypeConfig>,

    #[serde(skip)]
    base_dir: PathBuf,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let mut config = toml::from_str::<Config>(
            &std::fs::read_to_string(path)
                .with_context(|| format!("Failed to load config file '{}'.", path))?,
        )
        .with_context(|| format!("Failed to parse config file '{}'.", path))?;
        config.base_dir = Path::new(path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    fn load_schema(&self, path: &str) -> Result<ComposedSchema> {
        let path = self.base_dir.join(path);
        let document = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to load schema file '{}'.", path.display()))?;
        ComposedSchema::parse(&document)
            .with_context(|| format!("Failed to parse schema file '{}'.", path.display()))
    }

    pub fn gateway_schema(&self) -> Result<ComposedSchema> {
        self.load_schema(&self.schema)
    }

    /// Builds the stitching info handed to the transform. `None` when the
    /// config describes no subschemas.
    pub fn stitching_info(&self) -> Result<Option<StitchingInfo>> {
        if self.subschemas.is_empty() {
            return Ok(None);
        }

        let mut subschemas = IndexMap::new();
        for subschema in &self.subschemas {
            let schema = self.load_schema(&subschema.schema)?;
            tracing::info!(
                name = %subschema.name,
                types = schema.types().count(),
                "Subschema loaded."
            );
            subschemas.insert(
                subschema.name.clone(),
                Arc::new(Subschema {
                    name: subschema.name.clone(),
                    schema: Arc::new(schema),
                }),
            );
        }
        let subschema = |name: &str| {
            subschemas
                .get(name)
                .cloned()
                .with_context(|| format!("Unknown subschema '{}'.", name))
        };

        let mut info = StitchingInfo::default();
        for (type_name, merged_type) in &self.merged_types {
            let mut merged_type_info = MergedTypeInfo::default();
            for (name, selection_set) in &merged_type.selection_sets {
                merged_type_info.selection_sets.push((
                    subschema(name)?,
                    parse_selection_set(selection_set).with_context(|| {
                        format!("Invalid selection set of '{}' in '{}'.", type_name, name)
                    })?,
                ));
            }
            for (name, fields) in &merged_type.field_selection_sets {
                let mut selection_sets = IndexMap::new();
                for (field_name, selection_set) in fields {
                    selection_sets.insert(
                        Name::new(field_name),
                        parse_selection_set(selection_set).with_context(|| {
                            format!(
                                "Invalid selection set of '{}.{}' in '{}'.",
                                type_name, field_name, name
                            )
                        })?,
                    );
                }
                merged_type_info
                    .field_selection_sets
                    .push((subschema(name)?, selection_sets));
            }
            info.merged_types
                .insert(Name::new(type_name), merged_type_info);
        }
        Ok(Some(info))
    }
}
