//! Resolution engine: version constraint algebra, parent-chain inheritance
//! with nearest-wins management merge, declaration-level dependency merge,
//! multi-module root placement, and the run-scoped resolution context that
//! caches resolved models by document identity.

pub mod constraint;
pub mod context;
pub mod graph;
pub mod inheritance;
pub mod merge;
pub mod version;
pub mod working_set;
