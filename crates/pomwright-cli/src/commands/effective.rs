//! Handler for `pomwright effective`.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use miette::Result;
use serde::Serialize;

use pomwright_core::document::Document;
use pomwright_core::finding::Finding;
use pomwright_resolver::inheritance::ResolvedModel;
use pomwright_resolver::working_set::WorkingSet;
use pomwright_util::errors::PomwrightError;

use super::{read_document, SessionOptions};

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct EffectiveReport<'m> {
    document: String,
    chain: Vec<String>,
    properties: &'m BTreeMap<String, String>,
    managed: Vec<ManagedRow>,
    findings: &'m [Finding],
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct ManagedRow {
    key: String,
    version: Option<String>,
    scope: Option<String>,
    declared_in: String,
    imported_from: Option<String>,
}

impl<'m> EffectiveReport<'m> {
    fn new(model: &'m ResolvedModel) -> Self {
        Self {
            document: model.document.to_string(),
            chain: model
                .chain
                .iter()
                .map(|entry| match entry.document() {
                    Some(doc) => doc.id.to_string(),
                    None => "<unavailable>".to_string(),
                })
                .collect(),
            properties: &model.properties.values,
            managed: model
                .managed
                .iter()
                .map(|(key, entry)| ManagedRow {
                    key: key.to_string(),
                    version: entry.version.clone(),
                    scope: entry.dependency.scope.map(|s| s.to_string()),
                    declared_in: entry.declared_in.to_string(),
                    imported_from: entry.imported_from.as_ref().map(|c| c.to_string()),
                })
                .collect(),
            findings: &model.findings,
        }
    }

    fn print(&self) {
        println!("Effective model of {}", self.document);
        if !self.chain.is_empty() {
            println!("  parents: {}", self.chain.join(" -> "));
        }
        println!("Properties:");
        for (name, value) in self.properties {
            println!("  {name} = {value}");
        }
        println!("Managed dependencies:");
        for row in &self.managed {
            let version = row.version.as_deref().unwrap_or("-");
            let mut line = format!("  {} {version}", row.key);
            if let Some(ref scope) = row.scope {
                line.push_str(&format!(" ({scope})"));
            }
            match row.imported_from {
                Some(ref bom) => line.push_str(&format!(" via {bom}")),
                None => line.push_str(&format!(" from {}", row.declared_in)),
            }
            println!("{line}");
        }
        for finding in self.findings {
            eprintln!("warning: {finding}");
        }
    }
}

/// Load `pom` plus the local parents reachable through `<relativePath>`
/// (default `../pom.xml`) whose coordinates match the reference.
fn load_with_local_parents(pom: &Path) -> Result<Vec<Document>> {
    let first = read_document(pom)?;
    let mut seen: HashSet<PathBuf> = HashSet::new();
    seen.insert(pom.to_path_buf());
    let mut documents = vec![first];

    loop {
        let Some(parent) = documents.last().and_then(|d| d.parent.clone()) else {
            break;
        };
        let Some(current) = documents.last().and_then(|d| d.source_path.clone()) else {
            break;
        };
        let relative = parent.relative_path.as_deref().unwrap_or("../pom.xml");
        if relative.is_empty() {
            break;
        }
        let dir = current.parent().unwrap_or_else(|| Path::new(""));
        let mut candidate = dir.join(relative);
        if candidate.is_dir() {
            candidate = candidate.join("pom.xml");
        }
        if !candidate.is_file() || !seen.insert(candidate.clone()) {
            break;
        }
        let doc = read_document(&candidate)?;
        if doc.coordinates().ok() != Some(parent.coordinates()) {
            tracing::debug!("{} is not the parent {}", candidate.display(), parent.coordinates());
            break;
        }
        tracing::debug!("Using local parent {}", candidate.display());
        documents.push(doc);
    }
    Ok(documents)
}

pub(crate) fn exec(options: &SessionOptions, pom: &Path, json: bool) -> Result<()> {
    let documents = load_with_local_parents(pom)?;
    let session = options.open(&documents)?;
    let set = WorkingSet::new(documents);
    let Some(target) = set.documents().first().map(Arc::clone) else {
        return Err(PomwrightError::Generic {
            message: format!("Could not load {}", pom.display()),
        }
        .into());
    };
    let model = session.resolution.model(&target, &set)?;
    let report = EffectiveReport::new(&model);

    if json {
        let out = serde_json::to_string_pretty(&report).map_err(|e| PomwrightError::Generic {
            message: format!("Failed to serialize model: {e}"),
        })?;
        println!("{out}");
    } else {
        report.print();
    }
    Ok(())
}
