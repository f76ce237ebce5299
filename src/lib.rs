//! Open Library catalog client
//!
//! Typed access to the Open Library bibliographic catalog: works, editions,
//! and authors as schema-validated records, plus the HTTP resolution and
//! mutation flows that tie them together.
//!
//! Records keep their recognized fields typed and carry every other wire
//! field in an ordered opaque bag, so documents round-trip untouched. Free
//! text fields (`description`, `notes`, `bio`) are plain strings in memory
//! whichever of the two wire shapes they arrived in, and always serialize to
//! the tagged form.
//!
//! # Example
//!
//! ```no_run
//! use ol_client::{Config, OpenLibrary};
//!
//! # fn main() -> Result<(), ol_client::ClientError> {
//! let ol = OpenLibrary::new(Config::default())?;
//!
//! if let Some(edition) = ol.edition_by_isbn("0374202915")? {
//!     println!("{} ({})", edition.title.as_deref().unwrap_or("?"), edition.olid);
//!     for author in &edition.authors {
//!         println!("  by {}", author.name);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Outcomes
//!
//! Every lookup ends one of three ways: a populated record, `Ok(None)` for a
//! miss on a bib-key/search/autocomplete resolution, or an error. Non-2xx
//! responses are never swallowed into `None`; they surface as
//! [`ClientError::Network`] with the status intact. Validation failures come
//! only from the explicit `validate` calls.

mod book;
mod client;
mod entities;
mod error;
mod schema;
mod types;

pub use book::{Book, BookAuthor, PRIMARY_IDENTIFIER_SCHEMES};
pub use client::{Config, Credentials, OpenLibrary, DEFAULT_BASE_URL};
pub use entities::{Author, Delete, Edition, Entity, Record, Redirect, Work};
pub use error::{ClientError, DocumentError, OlidError, SchemaError, ValidateError};
pub use schema::{schema_for, validate_against_schema, validate_document};
pub use types::{KeyRef, Olid, RecordKind, Text, TypedDatetime};
