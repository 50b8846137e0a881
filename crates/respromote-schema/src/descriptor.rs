//! Typed views of the `RuleApp` and library documents returned by the
//! management API.
//!
//! Only the fields the promoter consults are modelled. Unknown fields are
//! ignored; a missing required field is a decode error.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{MANAGED_XOM_PROPERTY, SchemaError};

/// A deployed `RuleApp` as described by `/ruleapps/{name}/{version}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAppDescriptor {
    /// Identifier of the form `name/version`.
    pub id: String,

    /// Rulesets in document order.
    pub rulesets: Vec<RulesetDescriptor>,
}

/// A ruleset entry inside a [`RuleAppDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RulesetDescriptor {
    /// Ruleset properties in document order.
    #[serde(default)]
    pub properties: Vec<Property>,
}

/// A single `{ id, value }` ruleset property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Property name, e.g. `ruleset.managedxom.uris`.
    pub id: String,

    /// Property value. Some server builds omit it for unset properties.
    #[serde(default)]
    pub value: Option<String>,
}

/// A managed XOM library as described by `/libraries/{name}/{version}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryDescriptor {
    /// Member XOM URIs in document order.
    pub content: Vec<String>,
}

impl RuleAppDescriptor {
    /// Decode a descriptor from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Decode`] if `id` or `rulesets` is missing or
    /// has the wrong type.
    pub fn from_json(value: Value) -> Result<Self, SchemaError> {
        serde_json::from_value(value).map_err(|source| SchemaError::Decode {
            document: "RuleApp descriptor",
            source,
        })
    }

    /// The version token: everything after the first `/` of the id.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidId`] if the id has no `/` or either side
    /// of it is empty.
    pub fn version(&self) -> Result<&str, SchemaError> {
        match self.id.split_once('/') {
            Some((name, version)) if !name.is_empty() && !version.is_empty() => Ok(version),
            _ => Err(SchemaError::InvalidId(self.id.clone())),
        }
    }

    /// Collect the managed XOM URIs referenced by every ruleset.
    ///
    /// URIs are deduplicated by string equality, keeping the first occurrence,
    /// so the result follows document order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingField`] if a managed XOM property has no
    /// value.
    pub fn managed_xom_uris(&self) -> Result<Vec<&str>, SchemaError> {
        let mut seen = HashSet::new();
        let mut uris = Vec::new();

        for property in self.rulesets.iter().flat_map(|r| &r.properties) {
            if property.id != MANAGED_XOM_PROPERTY {
                continue;
            }
            let value = property
                .value
                .as_deref()
                .ok_or(SchemaError::MissingField("value"))?;
            if seen.insert(value) {
                uris.push(value);
            }
        }

        Ok(uris)
    }
}

impl LibraryDescriptor {
    /// Decode a library descriptor from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Decode`] if `content` is missing or is not a
    /// list of strings.
    pub fn from_json(value: Value) -> Result<Self, SchemaError> {
        serde_json::from_value(value).map_err(|source| SchemaError::Decode {
            document: "library descriptor",
            source,
        })
    }

    /// The plain-text body used to create the library on a server: member
    /// URIs joined with `", "`.
    pub fn content_body(&self) -> String {
        self.content.join(", ")
    }
}
