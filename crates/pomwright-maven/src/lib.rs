//! Maven boundary: POM reading and writing, settings.xml, repository
//! metadata, blocking downloads, the run-scoped session cache, and the
//! artifact sources consulted for documents outside the working set.

pub mod cache;
pub mod download;
pub mod metadata;
pub mod pom;
pub mod repository;
pub mod settings;
pub mod source;
