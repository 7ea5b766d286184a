//! Shared utilities for pomwright.
//!
//! This crate provides the cross-cutting pieces used by all other pomwright
//! crates: the unified error type and glob matching over Maven coordinates.

pub mod errors;
pub mod glob;
