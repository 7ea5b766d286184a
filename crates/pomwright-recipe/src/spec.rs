//! Recipe lists declared in TOML.
//!
//! ```toml
//! [[recipe]]
//! type = "upgrade-dependency-version"
//! group-id = "org.slf4j"
//! artifact-id = "*"
//! new-version = "2.0.x"
//! ```

use std::path::Path;

use serde::Deserialize;

use pomwright_util::errors::PomwrightError;

use crate::recipe::Recipe;
use crate::recipes::{
    AddDependency, AddManagedDependency, ChangePropertyValue, RemoveDependency,
    RemoveRedundantDependencyVersions, UpgradeDependencyVersion,
};

/// One `[[recipe]]` table, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RecipeSpec {
    AddDependency(AddDependency),
    AddManagedDependency(AddManagedDependency),
    UpgradeDependencyVersion(UpgradeDependencyVersion),
    RemoveRedundantDependencyVersions(RemoveRedundantDependencyVersions),
    ChangePropertyValue(ChangePropertyValue),
    RemoveDependency(RemoveDependency),
}

impl RecipeSpec {
    pub fn into_recipe(self) -> Box<dyn Recipe> {
        match self {
            RecipeSpec::AddDependency(r) => Box::new(r),
            RecipeSpec::AddManagedDependency(r) => Box::new(r),
            RecipeSpec::UpgradeDependencyVersion(r) => Box::new(r),
            RecipeSpec::RemoveRedundantDependencyVersions(r) => Box::new(r),
            RecipeSpec::ChangePropertyValue(r) => Box::new(r),
            RecipeSpec::RemoveDependency(r) => Box::new(r),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecipeFile {
    #[serde(default, rename = "recipe")]
    recipes: Vec<RecipeSpec>,
}

/// Parse a recipe list, preserving declaration order.
pub fn parse_recipes(content: &str) -> Result<Vec<RecipeSpec>, PomwrightError> {
    let file: RecipeFile = toml::from_str(content).map_err(|e| PomwrightError::Config {
        message: format!("Failed to parse recipe list: {e}"),
    })?;
    Ok(file.recipes)
}

/// Load the recipes declared in `path`.
pub fn load_recipes(path: &Path) -> miette::Result<Vec<Box<dyn Recipe>>> {
    let content = std::fs::read_to_string(path).map_err(|e| PomwrightError::Config {
        message: format!("Failed to read {}: {e}", path.display()),
    })?;
    let specs = parse_recipes(&content)?;
    tracing::debug!("Loaded {} recipes from {}", specs.len(), path.display());
    Ok(specs.into_iter().map(RecipeSpec::into_recipe).collect())
}
