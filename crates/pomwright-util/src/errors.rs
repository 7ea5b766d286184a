use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all pomwright operations.
#[derive(Debug, Error, Diagnostic)]
pub enum PomwrightError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A POM, settings or metadata document could not be read as XML.
    #[error("XML error: {message}")]
    #[diagnostic(help("Check the file for unbalanced tags or invalid characters"))]
    Xml { message: String },

    /// Invalid or malformed configuration (e.g. pomwright.toml or a recipe file).
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check your pomwright.toml and recipe files for syntax errors"))]
    Config { message: String },

    /// The parent chain of a document loops back on itself.
    #[error("Parent cycle detected for {document}: {}", cycle.join(" -> "))]
    #[diagnostic(help("A document cannot be its own ancestor; fix the <parent> references"))]
    ParentCycle {
        document: String,
        cycle: Vec<String>,
    },

    /// Coordinates missing or unusable (no artifactId, empty groupId, ...).
    #[error("Malformed coordinates in {document}: {message}")]
    MalformedCoordinates { document: String, message: String },

    /// Property substitution did not stabilize within the pass limit.
    #[error("Property `{name}` in {document} did not resolve within {passes} passes")]
    #[diagnostic(help("The property refers to itself, directly or through other properties"))]
    SelfReferentialProperty {
        document: String,
        name: String,
        passes: usize,
    },

    /// A version constraint expression could not be parsed.
    #[error("Invalid version constraint `{spec}`: {reason}")]
    InvalidConstraint { spec: String, reason: String },

    /// No candidate version satisfies a constraint.
    #[error("No version of {coordinate} satisfies `{constraint}` ({candidates} candidates considered)")]
    UnsatisfiableConstraint {
        coordinate: String,
        constraint: String,
        candidates: usize,
    },

    /// A recipe was configured with missing or invalid fields.
    #[error("Recipe `{recipe}` is invalid: {}", defects.join("; "))]
    Validation { recipe: String, defects: Vec<String> },

    /// Network request or download failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type PomwrightResult<T> = miette::Result<T>;
