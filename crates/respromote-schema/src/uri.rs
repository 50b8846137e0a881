//! Managed XOM URIs.
//!
//! A ruleset points at its execution object model either directly
//! (`res://name/version`) or through a library (`reslib://name/version`).
//! The `name/version` path after `//` is the key used to address the
//! artifact on a server.

use std::fmt;

use crate::{LIBRARY_MARKER, SchemaError};

/// A managed URI, classified by whether it names a library or a single XOM.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ManagedUri {
    /// A XOM library (`reslib://...`).
    Library(String),
    /// An individual XOM archive.
    Xom(String),
}

impl ManagedUri {
    /// Classify a raw URI. Any URI containing `reslib` is a library.
    pub fn parse(uri: &str) -> Self {
        if uri.contains(LIBRARY_MARKER) {
            Self::Library(uri.to_string())
        } else {
            Self::Xom(uri.to_string())
        }
    }

    /// The URI exactly as it appeared in the ruleset property.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Library(uri) | Self::Xom(uri) => uri,
        }
    }

    /// Whether this URI names a XOM library.
    pub fn is_library(&self) -> bool {
        matches!(self, Self::Library(_))
    }

    /// The `name/version` key: everything after the first `//`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidUri`] if the URI has no `//` or nothing
    /// follows it.
    pub fn name_version(&self) -> Result<&str, SchemaError> {
        let uri = self.as_str();
        match uri.split_once("//") {
            Some((_, path)) if !path.is_empty() => Ok(path),
            _ => Err(SchemaError::InvalidUri(uri.to_string())),
        }
    }

    /// The version-less artifact name: the key up to its first `/`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidUri`] if the key has no `/` separating
    /// name from version.
    pub fn name(&self) -> Result<&str, SchemaError> {
        match self.name_version()?.split_once('/') {
            Some((name, _)) if !name.is_empty() => Ok(name),
            _ => Err(SchemaError::InvalidUri(self.as_str().to_string())),
        }
    }
}

impl fmt::Display for ManagedUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_by_marker() {
        assert!(ManagedUri::parse("reslib://libA/2").is_library());
        assert!(!ManagedUri::parse("res://xomA/2").is_library());
        assert!(!ManagedUri::parse("resuri://model.jar/1.0").is_library());
    }

    #[test]
    fn test_name_version_and_name() {
        let lib = ManagedUri::parse("reslib://libA/2");
        assert_eq!(lib.name_version().unwrap(), "libA/2");
        assert_eq!(lib.name().unwrap(), "libA");

        let xom = ManagedUri::parse("res://xom-model.jar/1.0");
        assert_eq!(xom.name_version().unwrap(), "xom-model.jar/1.0");
        assert_eq!(xom.name().unwrap(), "xom-model.jar");
        assert_eq!(xom.to_string(), "res://xom-model.jar/1.0");
    }

    #[test]
    fn test_malformed_uris() {
        assert!(matches!(
            ManagedUri::parse("xomA/2").name_version(),
            Err(SchemaError::InvalidUri(_))
        ));
        assert!(matches!(
            ManagedUri::parse("res://").name_version(),
            Err(SchemaError::InvalidUri(_))
        ));
        assert!(matches!(
            ManagedUri::parse("res://xomA").name(),
            Err(SchemaError::InvalidUri(_))
        ));
    }
}
