//! Shared wire types for the Rule Execution Server (RES) management API.
//!
//! The management API speaks loosely structured JSON. This crate decodes the
//! handful of documents the promoter relies on into typed records and keeps
//! the string conventions (ids, managed XOM URIs) in one place.

pub mod descriptor;
pub mod uri;

pub use descriptor::{LibraryDescriptor, Property, RuleAppDescriptor, RulesetDescriptor};
pub use uri::ManagedUri;

/// Ruleset property holding the managed XOM URI a ruleset depends on.
pub const MANAGED_XOM_PROPERTY: &str = "ruleset.managedxom.uris";

/// Token that marks a managed URI as a XOM library rather than a single XOM.
pub const LIBRARY_MARKER: &str = "reslib";

/// Errors raised while interpreting management API documents.
#[derive(thiserror::Error, Debug)]
pub enum SchemaError {
    /// The document is not valid JSON or does not match the expected shape.
    #[error("Malformed {document}: {source}")]
    Decode {
        /// Kind of document being decoded, such as `"RuleApp descriptor"`.
        document: &'static str,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },

    /// A required field is present but unusable.
    #[error("Missing field '{0}'")]
    MissingField(&'static str),

    /// A `RuleApp` id is not of the form `name/version`.
    #[error("Invalid RuleApp id '{0}': expected 'name/version'")]
    InvalidId(String),

    /// A managed URI does not carry a `scheme://name/version` path.
    #[error("Invalid managed URI '{0}': expected 'scheme://name/version'")]
    InvalidUri(String),
}
