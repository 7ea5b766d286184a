//! Cycle-based recipe scheduler.
//!
//! State machine: `Idle -> Cycle(1) -> ... -> Converged | CapReached`. Every
//! cycle prepares all recipes serially against the cycle-start working set,
//! then applies them in declared order, each over the working set left by
//! the previous one. A cycle with zero document-level changes converges.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;
use serde::Serialize;

use pomwright_core::config::RunConfig;
use pomwright_core::document::{Document, DocumentId};
use pomwright_core::finding::Finding;
use pomwright_maven::source::StaticSource;
use pomwright_resolver::context::ResolutionContext;
use pomwright_resolver::graph::ModuleGraph;
use pomwright_resolver::working_set::WorkingSet;

use crate::recipe::{PreparedRecipe, Recipe, RecipeContext, Transform};

/// Recipe name recorded for documents whose effective model cannot be
/// built at the end of a run.
pub const RESOLUTION: &str = "resolution";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunState {
    Idle,
    Cycle(usize),
    Converged,
    CapReached,
}

/// A document that differs from its initial version; `after` is `None`
/// for deleted documents.
#[derive(Debug, Clone)]
pub struct RecipeResult {
    pub before: Arc<Document>,
    pub after: Option<Arc<Document>>,
}

impl RecipeResult {
    pub fn id(&self) -> &DocumentId {
        &self.before.id
    }

    pub fn is_deleted(&self) -> bool {
        self.after.is_none()
    }
}

/// A recipe that failed on one document (or during preparation when
/// `document` is `None`). Other documents are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeFailure {
    pub recipe: String,
    pub document: Option<DocumentId>,
    pub cycle: usize,
    pub message: String,
}

impl fmt::Display for RecipeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.document {
            Some(ref doc) => write!(f, "[cycle {}] {} on {doc}: {}", self.cycle, self.recipe, self.message),
            None => write!(f, "[cycle {}] {}: {}", self.cycle, self.recipe, self.message),
        }
    }
}

/// A recipe skipped because validation reported defects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidRecipe {
    pub recipe: String,
    pub defects: Vec<String>,
}

/// Outcome of one scheduler run. Always complete: partial results plus an
/// explicit failure list.
#[derive(Debug)]
pub struct RecipeRun {
    pub state: RunState,
    /// Cycles executed, including the one that confirmed convergence.
    pub cycles: usize,
    /// Number of cycles that made changes, when the run converged.
    pub converged_after: Option<usize>,
    pub results: Vec<RecipeResult>,
    pub failures: Vec<RecipeFailure>,
    pub invalid: Vec<InvalidRecipe>,
    pub findings: Vec<Finding>,
    /// The final working set.
    pub documents: WorkingSet,
}

impl RecipeRun {
    pub fn is_converged(&self) -> bool {
        self.state == RunState::Converged
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty() || !self.invalid.is_empty()
    }

    pub fn changed(&self) -> impl Iterator<Item = &RecipeResult> {
        self.results.iter().filter(|r| !r.is_deleted())
    }

    pub fn deleted(&self) -> impl Iterator<Item = &RecipeResult> {
        self.results.iter().filter(|r| r.is_deleted())
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    max_cycles: usize,
    parallel: bool,
    jobs: usize,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::from_config(&RunConfig::default())
    }
}

impl Scheduler {
    pub fn new(max_cycles: usize) -> Self {
        Self {
            max_cycles,
            ..Self::default()
        }
    }

    pub fn from_config(run: &RunConfig) -> Self {
        Self {
            max_cycles: run.max_cycles,
            parallel: run.parallel,
            jobs: run.jobs as usize,
        }
    }

    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn max_cycles(&self) -> usize {
        self.max_cycles
    }

    fn pool(&self) -> Option<ThreadPool> {
        if !self.parallel || self.jobs <= 1 {
            return None;
        }
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .thread_name(|index| format!("pomwright-worker-{index}"))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                tracing::warn!("Could not start worker pool, applying serially: {e}");
                None
            }
        }
    }

    pub fn run(
        &self,
        recipes: &[Box<dyn Recipe>],
        working_set: WorkingSet,
        resolution: &ResolutionContext,
    ) -> RecipeRun {
        let mut invalid = Vec::new();
        let runnable: Vec<&dyn Recipe> = recipes
            .iter()
            .map(Box::as_ref)
            .filter(|recipe| {
                let defects = recipe.validate();
                if defects.is_empty() {
                    return true;
                }
                tracing::warn!("Skipping `{}`: {}", recipe.name(), defects.join("; "));
                invalid.push(InvalidRecipe {
                    recipe: recipe.name().to_string(),
                    defects,
                });
                false
            })
            .collect();

        let original = working_set.documents().to_vec();
        let mut set = working_set;
        let pool = self.pool();
        let mut failures = Vec::new();
        let mut state = RunState::Idle;
        let mut cycles = 0;
        let mut changing_cycles = 0;

        for cycle in 1..=self.max_cycles.max(1) {
            state = RunState::Cycle(cycle);
            cycles = cycle;

            let prepared: Vec<(&dyn Recipe, Box<dyn PreparedRecipe>)> = {
                let graph = ModuleGraph::build(&set);
                let ctx = RecipeContext::new(&set, &graph, resolution);
                runnable
                    .iter()
                    .filter_map(|recipe| match guarded(|| recipe.prepare(&ctx)) {
                        Ok(p) => {
                            for (document, message) in p.failures() {
                                tracing::warn!("[cycle {cycle}] {} failed on {document}: {message}", recipe.name());
                                failures.push(RecipeFailure {
                                    recipe: recipe.name().to_string(),
                                    document: Some(document),
                                    cycle,
                                    message,
                                });
                            }
                            Some((*recipe, p))
                        }
                        Err(message) => {
                            tracing::warn!("[cycle {cycle}] {} could not prepare: {message}", recipe.name());
                            failures.push(RecipeFailure {
                                recipe: recipe.name().to_string(),
                                document: None,
                                cycle,
                                message,
                            });
                            None
                        }
                    })
                    .collect()
            };

            let mut changes = 0;
            for (recipe, prepared) in &prepared {
                changes += apply(
                    *recipe,
                    prepared.as_ref(),
                    cycle,
                    &mut set,
                    resolution,
                    pool.as_ref(),
                    &mut failures,
                );
            }
            tracing::info!("Cycle {cycle}: {changes} document changes");

            if changes == 0 {
                state = RunState::Converged;
                break;
            }
            changing_cycles += 1;
        }

        if state != RunState::Converged {
            tracing::warn!("Still changing after {} cycles", self.max_cycles);
            state = RunState::CapReached;
        }

        let results = original
            .iter()
            .filter_map(|before| match set.get(&before.id) {
                Some(after) if Arc::ptr_eq(after, before) || **after == **before => None,
                Some(after) => Some(RecipeResult {
                    before: Arc::clone(before),
                    after: Some(Arc::clone(after)),
                }),
                None => Some(RecipeResult {
                    before: Arc::clone(before),
                    after: None,
                }),
            })
            .collect();

        let mut findings: Vec<Finding> = Vec::new();
        for doc in set.iter() {
            match resolution.model(doc, &set) {
                Ok(model) => {
                    for finding in &model.findings {
                        if !findings.contains(finding) {
                            findings.push(finding.clone());
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("{} cannot be resolved: {e}", doc.id);
                    failures.push(RecipeFailure {
                        recipe: RESOLUTION.to_string(),
                        document: Some(doc.id.clone()),
                        cycle: cycles,
                        message: e.to_string(),
                    });
                }
            }
        }

        RecipeRun {
            state,
            cycles,
            converged_after: (state == RunState::Converged).then_some(changing_cycles),
            results,
            failures,
            invalid,
            findings,
            documents: set,
        }
    }
}

/// Run `recipes` over `documents` with default settings and no external
/// artifacts.
pub fn run(recipes: &[Box<dyn Recipe>], documents: Vec<Document>, max_cycles: usize) -> RecipeRun {
    let resolution = ResolutionContext::new(Arc::new(StaticSource::new()));
    Scheduler::new(max_cycles).run(recipes, WorkingSet::new(documents), &resolution)
}

/// Apply one prepared recipe to every document. Returns the number of
/// documents replaced or deleted.
fn apply(
    recipe: &dyn Recipe,
    prepared: &dyn PreparedRecipe,
    cycle: usize,
    set: &mut WorkingSet,
    resolution: &ResolutionContext,
    pool: Option<&ThreadPool>,
    failures: &mut Vec<RecipeFailure>,
) -> usize {
    let outcomes: Vec<(DocumentId, Result<Transform, String>)> = {
        let snapshot: &WorkingSet = set;
        for doc in snapshot.iter() {
            if let Err(e) = resolution.model(doc, snapshot) {
                tracing::debug!("{}: {e}", doc.id);
            }
        }
        let graph = ModuleGraph::build(snapshot);
        let ctx = RecipeContext::new(snapshot, &graph, resolution);
        let work = |doc: &Arc<Document>| (doc.id.clone(), guarded(|| prepared.transform(doc, &ctx)));
        match pool {
            Some(pool) => pool.install(|| snapshot.documents().par_iter().map(work).collect()),
            None => snapshot.iter().map(work).collect(),
        }
    };

    let mut changes = 0;
    for (id, outcome) in outcomes {
        match outcome {
            Ok(Transform::Unchanged) => {}
            Ok(Transform::Replace(mut next)) => {
                let Some(current) = set.get(&id) else {
                    continue;
                };
                next.id = id.clone();
                if **current == next {
                    continue;
                }
                tracing::debug!("[cycle {cycle}] {} changed {id}", recipe.name());
                set.replace(Arc::new(next));
                changes += 1;
            }
            Ok(Transform::Delete) => {
                if set.remove(&id).is_some() {
                    tracing::debug!("[cycle {cycle}] {} deleted {id}", recipe.name());
                    resolution.retire(&id);
                    changes += 1;
                }
            }
            Err(message) => {
                tracing::warn!("[cycle {cycle}] {} failed on {id}: {message}", recipe.name());
                failures.push(RecipeFailure {
                    recipe: recipe.name().to_string(),
                    document: Some(id),
                    cycle,
                    message,
                });
            }
        }
    }
    changes
}

/// Run `f`, turning both errors and panics into a message.
fn guarded<T>(f: impl FnOnce() -> miette::Result<T>) -> Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_become_messages() {
        let err = guarded::<()>(|| panic!("boom {}", 1)).unwrap_err();
        assert_eq!(err, "panicked: boom 1");
        let err = guarded::<()>(|| Err(miette::miette!("plain failure"))).unwrap_err();
        assert_eq!(err, "plain failure");
    }

    #[test]
    fn zero_cycles_still_runs_once() {
        let run = run(&[], Vec::new(), 0);
        assert_eq!(run.cycles, 1);
        assert_eq!(run.converged_after, Some(0));
        assert!(run.is_converged());
    }
}
