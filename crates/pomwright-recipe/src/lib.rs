//! Rewrite rules ("recipes") and the scheduler that applies them to a
//! working set until no rule produces further change.
//!
//! A [`recipe::Recipe`] is an immutable configuration value. At the start of
//! every cycle it is prepared serially against the whole working set; the
//! resulting [`recipe::PreparedRecipe`] then transforms documents, possibly
//! in parallel. The [`scheduler::Scheduler`] sequences recipes, isolates
//! per-document failures and stops at convergence or at the cycle cap.

pub mod recipe;
pub mod recipes;
pub mod scheduler;
pub mod spec;
pub mod testing;
