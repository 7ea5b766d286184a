//! Core data types for pomwright.
//!
//! This crate defines the immutable build descriptor model (documents,
//! dependencies, managed dependencies, plugins, repositories, profiles), the
//! node traversal used by rewrite rules, `${...}` property interpolation,
//! findings and the engine configuration.
//!
//! This crate is intentionally free of network I/O and XML.

pub mod config;
pub mod dependency;
pub mod document;
pub mod finding;
pub mod profile;
pub mod properties;
pub mod visit;
