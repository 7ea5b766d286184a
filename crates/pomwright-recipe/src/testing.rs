//! Test harness for recipes.
//!
//! [`RewriteTest`] runs recipes over POM sources and asserts the rewritten
//! text together with the exact cycle at which the run converged. A recipe
//! whose edits never stabilize fails here instead of passing silently.
//!
//! Expected text is compared in canonical form: both sides go through
//! [`pom::write_pom`], so layout differences in the test source do not matter.

use std::path::PathBuf;
use std::sync::Arc;

use pomwright_core::document::{Document, DocumentId};
use pomwright_maven::pom;
use pomwright_maven::source::StaticSource;
use pomwright_resolver::context::ResolutionContext;
use pomwright_resolver::working_set::WorkingSet;

use crate::recipe::Recipe;
use crate::scheduler::{RecipeRun, Scheduler};

/// One POM in a rewrite test: its path, its source and the expected result.
/// `after == None` means the document must come out unchanged.
#[derive(Debug, Clone, Copy)]
pub struct PomCase<'a> {
    pub path: &'a str,
    pub before: &'a str,
    pub after: Option<&'a str>,
}

impl<'a> PomCase<'a> {
    pub fn unchanged(path: &'a str, before: &'a str) -> Self {
        Self {
            path,
            before,
            after: None,
        }
    }

    pub fn changed(path: &'a str, before: &'a str, after: &'a str) -> Self {
        Self {
            path,
            before,
            after: Some(after),
        }
    }
}

pub struct RewriteTest {
    recipes: Vec<Box<dyn Recipe>>,
    source: StaticSource,
    expected_cycles: usize,
    parallel: bool,
}

impl RewriteTest {
    pub fn new(recipe: impl Recipe + 'static) -> Self {
        Self {
            recipes: vec![Box::new(recipe)],
            source: StaticSource::new(),
            expected_cycles: 1,
            parallel: false,
        }
    }

    pub fn with_recipe(mut self, recipe: impl Recipe + 'static) -> Self {
        self.recipes.push(Box::new(recipe));
        self
    }

    /// Documents and versions available outside the working set.
    pub fn with_source(mut self, source: StaticSource) -> Self {
        self.source = source;
        self
    }

    /// Number of cycles that must make changes before the run converges.
    pub fn expect_cycles(mut self, cycles: usize) -> Self {
        self.expected_cycles = cycles;
        self
    }

    /// Apply edits on a worker pool instead of serially.
    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    /// Run over `documents`, asserting convergence at the expected cycle and
    /// the absence of failures.
    pub fn run(&self, documents: Vec<Document>) -> RecipeRun {
        let resolution = ResolutionContext::new(Arc::new(self.source.clone()));
        // One spare cycle so the no-change confirmation fits under the cap.
        let scheduler = Scheduler::new(self.expected_cycles + 1)
            .with_parallel(self.parallel)
            .with_jobs(if self.parallel { 4 } else { 1 });
        let run = scheduler.run(&self.recipes, WorkingSet::new(documents), &resolution);

        assert!(
            run.failures.is_empty() && run.invalid.is_empty(),
            "recipe run recorded failures: {:?} {:?}",
            run.failures,
            run.invalid
        );
        assert_eq!(
            run.converged_after,
            Some(self.expected_cycles),
            "expected convergence after {} changing cycles, run ended in {:?} after {} cycles",
            self.expected_cycles,
            run.state,
            run.cycles
        );
        run
    }

    /// Parse each case, run, and compare every document with its expectation.
    pub fn rewrite_run(&self, cases: &[PomCase<'_>]) -> RecipeRun {
        let documents = cases
            .iter()
            .map(|case| {
                let mut doc = pom::parse_pom(case.before, case.path)
                    .unwrap_or_else(|e| panic!("{}: {e:?}", case.path));
                doc.source_path = Some(PathBuf::from(case.path));
                doc
            })
            .collect();
        let run = self.run(documents);

        for case in cases {
            let id = DocumentId::new(case.path);
            let result = run.results.iter().find(|r| r.id() == &id);
            match (case.after, result) {
                (None, None) => {}
                (None, Some(r)) => panic!(
                    "{} was expected to stay unchanged but became:\n{}",
                    case.path,
                    r.after.as_deref().map_or_else(|| "<deleted>".to_string(), pom::write_pom)
                ),
                (Some(_), None) => panic!("{} was expected to change but did not", case.path),
                (Some(expected), Some(r)) => {
                    let Some(after) = r.after.as_deref() else {
                        panic!("{} was deleted", case.path);
                    };
                    assert_eq!(pom::write_pom(after), canonical(expected, case.path), "{}", case.path);
                }
            }
        }
        run
    }
}

/// `xml` reprinted by the POM writer.
pub fn canonical(xml: &str, id: &str) -> String {
    let doc = pom::parse_pom(xml, id).unwrap_or_else(|e| panic!("{id}: {e:?}"));
    pom::write_pom(&doc)
}
