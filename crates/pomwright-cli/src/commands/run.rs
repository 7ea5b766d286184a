//! Handler for `pomwright run`.

use std::path::PathBuf;

use miette::Result;
use serde::Serialize;

use pomwright_core::finding::Finding;
use pomwright_maven::pom;
use pomwright_recipe::scheduler::{InvalidRecipe, RecipeFailure, RecipeRun, RunState, Scheduler};
use pomwright_recipe::spec::load_recipes;
use pomwright_resolver::working_set::WorkingSet;
use pomwright_util::errors::PomwrightError;

use super::{read_document, SessionOptions};

pub(crate) struct RunOptions {
    pub recipes: PathBuf,
    pub max_cycles: Option<usize>,
    pub dry_run: bool,
    pub json: bool,
    pub poms: Vec<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct RunReport<'r> {
    state: RunState,
    cycles: usize,
    converged_after: Option<usize>,
    changed: Vec<String>,
    deleted: Vec<String>,
    failures: &'r [RecipeFailure],
    invalid: &'r [InvalidRecipe],
    findings: &'r [Finding],
    dry_run: bool,
}

impl<'r> RunReport<'r> {
    fn new(run: &'r RecipeRun, dry_run: bool) -> Self {
        Self {
            state: run.state,
            cycles: run.cycles,
            converged_after: run.converged_after,
            changed: run.changed().map(|r| r.id().to_string()).collect(),
            deleted: run.deleted().map(|r| r.id().to_string()).collect(),
            failures: &run.failures,
            invalid: &run.invalid,
            findings: &run.findings,
            dry_run,
        }
    }

    fn print(&self) {
        match self.converged_after {
            Some(n) => println!("Converged after {n} changing cycle(s) ({} run)", self.cycles),
            None => println!("Still changing after {} cycles", self.cycles),
        }
        let verb = if self.dry_run { "Would change" } else { "Changed" };
        for id in &self.changed {
            println!("  {verb} {id}");
        }
        let verb = if self.dry_run { "Would delete" } else { "Deleted" };
        for id in &self.deleted {
            println!("  {verb} {id}");
        }
        if self.changed.is_empty() && self.deleted.is_empty() {
            println!("  No changes.");
        }
        for invalid in self.invalid {
            eprintln!("invalid recipe {}: {}", invalid.recipe, invalid.defects.join("; "));
        }
        for failure in self.failures {
            eprintln!("failure: {failure}");
        }
        for finding in self.findings {
            eprintln!("warning: {finding}");
        }
    }
}

pub(crate) fn exec(options: &SessionOptions, run: &RunOptions) -> Result<()> {
    let recipes = load_recipes(&run.recipes)?;
    let documents = run
        .poms
        .iter()
        .map(|path| read_document(path))
        .collect::<Result<Vec<_>>>()?;

    let session = options.open(&documents)?;
    let mut scheduler = Scheduler::from_config(&session.config.run);
    if let Some(max) = run.max_cycles {
        scheduler = scheduler.with_max_cycles(max);
    }

    tracing::info!("Running {} recipes over {} documents", recipes.len(), documents.len());
    let outcome = scheduler.run(&recipes, WorkingSet::new(documents), &session.resolution);
    let report = RunReport::new(&outcome, run.dry_run);

    if run.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| PomwrightError::Generic {
            message: format!("Failed to serialize report: {e}"),
        })?;
        println!("{json}");
    } else {
        report.print();
    }

    if !run.dry_run {
        for result in &outcome.results {
            let Some(path) = result.before.source_path.as_deref() else {
                continue;
            };
            match result.after {
                Some(ref after) => std::fs::write(path, pom::write_pom(after)).map_err(PomwrightError::Io)?,
                None => std::fs::remove_file(path).map_err(PomwrightError::Io)?,
            }
        }
    }

    if outcome.has_failures() {
        return Err(PomwrightError::Generic {
            message: format!(
                "{} recipe failure(s) and {} invalid recipe(s) recorded",
                outcome.failures.len(),
                outcome.invalid.len()
            ),
        }
        .into());
    }
    Ok(())
}
