//! Service-agnostic book metadata, the input to the create-book flow.
//!
//! These are plain value objects with no catalog identifiers attached; the
//! client resolves them against the service when a record is created.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Identifier schemes accepted for record creation, in preference order.
pub const PRIMARY_IDENTIFIER_SCHEMES: &[&str] = &["isbn_10", "isbn_13", "lccn"];

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BookAuthor {
    pub name: String,
}

impl BookAuthor {
    pub fn new(name: impl Into<String>) -> Self {
        BookAuthor { name: name.into() }
    }
}

/// A book as the caller knows it, before it exists in the catalog.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Vec<BookAuthor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<i64>,
    /// Identifier scheme name to list of values.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub identifiers: HashMap<String, Vec<String>>,
}

impl Book {
    pub fn new(title: impl Into<String>) -> Self {
        Book {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Add one identifier value under a scheme name.
    pub fn add_identifier(&mut self, scheme: impl Into<String>, value: impl Into<String>) {
        self.identifiers
            .entry(scheme.into())
            .or_default()
            .push(value.into());
    }

    /// The first author, whose name the create flow resolves to a catalog
    /// identifier.
    pub fn primary_author(&self) -> Option<&BookAuthor> {
        self.authors.first()
    }

    /// Pick the identifier used for record creation: the first populated
    /// scheme in [`PRIMARY_IDENTIFIER_SCHEMES`] order.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NoUsableIdentifier` when no supported scheme
    /// has a value.
    pub fn primary_identifier(&self) -> Result<(&'static str, &str), ClientError> {
        for &scheme in PRIMARY_IDENTIFIER_SCHEMES {
            if let Some(value) = self.identifiers.get(scheme).and_then(|values| values.first()) {
                return Ok((scheme, value.as_str()));
            }
        }
        Err(ClientError::NoUsableIdentifier)
    }
}
