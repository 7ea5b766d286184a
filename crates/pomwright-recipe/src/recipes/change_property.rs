use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;

use pomwright_core::document::{Document, DocumentId};

use super::roots_using;
use crate::recipe::{require, PreparedRecipe, Recipe, RecipeContext, Transform};

/// Set a property wherever a document defines it. With `add-if-missing`,
/// in-set roots that lack it get it too.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChangePropertyValue {
    pub key: String,
    pub new_value: String,
    #[serde(default)]
    pub add_if_missing: bool,
}

impl ChangePropertyValue {
    pub fn new(key: &str, new_value: &str) -> Self {
        Self {
            key: key.to_string(),
            new_value: new_value.to_string(),
            add_if_missing: false,
        }
    }

    pub fn add_if_missing(mut self) -> Self {
        self.add_if_missing = true;
        self
    }
}

impl Recipe for ChangePropertyValue {
    fn name(&self) -> &'static str {
        "change-property-value"
    }

    fn validate(&self) -> Vec<String> {
        let mut defects = Vec::new();
        require(&mut defects, "key", &self.key);
        if self.key.contains("${") || self.key.contains('}') {
            defects.push(format!("`key`: `{}` is not a property name", self.key));
        }
        defects
    }

    fn prepare(&self, ctx: &RecipeContext<'_>) -> miette::Result<Box<dyn PreparedRecipe>> {
        let roots = if self.add_if_missing {
            roots_using(ctx, None)
        } else {
            HashSet::new()
        };
        Ok(Box::new(PreparedChange {
            recipe: self.clone(),
            roots,
        }))
    }
}

struct PreparedChange {
    recipe: ChangePropertyValue,
    roots: HashSet<DocumentId>,
}

impl PreparedRecipe for PreparedChange {
    fn transform(&self, doc: &Arc<Document>, _ctx: &RecipeContext<'_>) -> miette::Result<Transform> {
        let key = self.recipe.key.trim();
        let value = &self.recipe.new_value;
        Ok(match doc.properties.get(key) {
            Some(current) if current == value => Transform::Unchanged,
            Some(_) => Transform::Replace(doc.with_property(key, value)),
            None if self.roots.contains(&doc.id) => Transform::Replace(doc.with_property(key, value)),
            None => Transform::Unchanged,
        })
    }
}
