//! Typed catalog records and their wire JSON mapping.
//!
//! Each record keeps its recognized fields typed and everything else in an
//! ordered opaque bag, so documents round-trip without this crate having to
//! understand every field the service emits. Serialization re-merges bag and
//! known fields deterministically: bag entries first (wire order), computed
//! and known fields overwriting.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::error::{DocumentError, ValidateError};
use crate::schema;
use crate::types::{KeyRef, Olid, RecordKind, Text, TypedDatetime};

/// A record that serializes to its canonical wire JSON.
///
/// Implemented by the three catalog records and the two pseudo-records
/// (`Delete`, `Redirect`); batched saves accept any mix of them.
pub trait Entity {
    /// Canonical wire representation of this record.
    fn to_json(&self) -> Value;
}

fn take_field<T: DeserializeOwned>(
    doc: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<T>, DocumentError> {
    match doc.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| DocumentError::MalformedField { field, source }),
    }
}

fn require_field<T: DeserializeOwned>(
    doc: &mut Map<String, Value>,
    field: &'static str,
) -> Result<T, DocumentError> {
    take_field(doc, field)?.ok_or(DocumentError::MissingField { field })
}

// Null-valued bag entries mean "never set" and stay off the wire.
fn strip_nulls(extra: &Map<String, Value>) -> Map<String, Value> {
    extra
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// A person record (`OL…A`).
#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub olid: Olid,
    pub name: String,
    pub bio: Option<Text>,
    /// External identifier schemes, e.g. `viaf` or `wikidata`.
    pub identifiers: Map<String, Value>,
    pub revision: Option<i64>,
    pub last_modified: Option<TypedDatetime>,
    /// Wire fields this model does not interpret, kept for round-tripping.
    pub extra: Map<String, Value>,
}

impl Author {
    pub fn new(olid: Olid, name: impl Into<String>) -> Self {
        Author {
            olid,
            name: name.into(),
            bio: None,
            identifiers: Map::new(),
            revision: None,
            last_modified: None,
            extra: Map::new(),
        }
    }

    /// Build an author from its raw wire document.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::MissingField` when `name` is absent, or
    /// `MalformedField` when a recognized field fails to parse.
    pub fn from_document(olid: Olid, mut doc: Map<String, Value>) -> Result<Self, DocumentError> {
        doc.remove("key");
        let name = require_field(&mut doc, "name")?;
        let bio = take_field(&mut doc, "bio")?;
        let identifiers = take_field(&mut doc, "identifiers")?.unwrap_or_default();
        let revision = take_field(&mut doc, "revision")?;
        let last_modified = take_field(&mut doc, "last_modified")?;
        Ok(Author {
            olid,
            name,
            bio,
            identifiers,
            revision,
            last_modified,
            extra: doc,
        })
    }

    /// Validate the wire form of this record against the author schema.
    pub fn validate(&self) -> Result<(), ValidateError> {
        schema::validate_document(RecordKind::Author, &self.to_json())
    }

    pub fn to_json(&self) -> Value {
        let mut out = strip_nulls(&self.extra);
        out.insert("key".into(), json!(self.olid.key()));
        out.insert("type".into(), json!({"key": RecordKind::Author.type_key()}));
        out.insert("name".into(), json!(self.name));
        if let Some(bio) = &self.bio {
            out.insert("bio".into(), json!(bio));
        }
        if !self.identifiers.is_empty() {
            out.insert("identifiers".into(), Value::Object(self.identifiers.clone()));
        }
        if let Some(revision) = self.revision {
            out.insert("revision".into(), json!(revision));
        }
        if let Some(last_modified) = &self.last_modified {
            out.insert("last_modified".into(), json!(last_modified));
        }
        Value::Object(out)
    }
}

impl Entity for Author {
    fn to_json(&self) -> Value {
        Author::to_json(self)
    }
}

/// A work record (`OL…W`): the abstract written thing, as opposed to a
/// printed edition of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Work {
    pub olid: Olid,
    pub title: Option<String>,
    pub description: Option<Text>,
    /// Author role references, kept exactly as they appear on the wire.
    /// Work lookups do not expand these into full author records.
    pub authors: Vec<Value>,
    pub revision: Option<i64>,
    pub last_modified: Option<TypedDatetime>,
    pub extra: Map<String, Value>,
}

impl Work {
    pub fn new(olid: Olid) -> Self {
        Work {
            olid,
            title: None,
            description: None,
            authors: Vec::new(),
            revision: None,
            last_modified: None,
            extra: Map::new(),
        }
    }

    /// Build a work from its raw wire document.
    pub fn from_document(olid: Olid, mut doc: Map<String, Value>) -> Result<Self, DocumentError> {
        doc.remove("key");
        let title = take_field(&mut doc, "title")?;
        let description = take_field(&mut doc, "description")?;
        let authors = take_field(&mut doc, "authors")?.unwrap_or_default();
        let revision = take_field(&mut doc, "revision")?;
        let last_modified = take_field(&mut doc, "last_modified")?;
        Ok(Work {
            olid,
            title,
            description,
            authors,
            revision,
            last_modified,
            extra: doc,
        })
    }

    /// Validate the wire form of this record against the work schema.
    pub fn validate(&self) -> Result<(), ValidateError> {
        schema::validate_document(RecordKind::Work, &self.to_json())
    }

    pub fn to_json(&self) -> Value {
        let mut out = strip_nulls(&self.extra);
        out.insert("key".into(), json!(self.olid.key()));
        out.insert("type".into(), json!({"key": RecordKind::Work.type_key()}));
        if let Some(title) = &self.title {
            out.insert("title".into(), json!(title));
        }
        if let Some(description) = &self.description {
            out.insert("description".into(), json!(description));
        }
        if !self.authors.is_empty() {
            out.insert("authors".into(), Value::Array(self.authors.clone()));
        }
        if let Some(revision) = self.revision {
            out.insert("revision".into(), json!(revision));
        }
        if let Some(last_modified) = &self.last_modified {
            out.insert("last_modified".into(), json!(last_modified));
        }
        Value::Object(out)
    }
}

impl Entity for Work {
    fn to_json(&self) -> Value {
        Work::to_json(self)
    }
}

/// An edition record (`OL…M`): one published form of a work.
///
/// The author representation is deliberately asymmetric: lookups expand the
/// wire's stub references into full [`Author`] records, while serialization
/// always collapses them back to stub references.
#[derive(Debug, Clone, PartialEq)]
pub struct Edition {
    pub olid: Olid,
    /// Parent work. An edition with no parent fails [`Edition::validate`];
    /// `None` is representable only so unattached drafts can be built and
    /// diagnosed.
    pub work_olid: Option<Olid>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub authors: Vec<Author>,
    /// Wire field `number_of_pages`.
    pub pages: Option<i64>,
    /// The service carries a vestigial singular `publisher` alongside
    /// `publishers`; it is never derived from the plural form.
    pub publisher: Option<String>,
    pub publishers: Vec<String>,
    /// Identifier scheme name (isbn_10, isbn_13, lccn, …) to list of values.
    pub identifiers: Map<String, Value>,
    /// Cover image ids. Only the plural form exists; a singular `cover`
    /// field is invalid.
    pub covers: Vec<i64>,
    pub description: Option<Text>,
    pub notes: Option<Text>,
    pub revision: Option<i64>,
    pub last_modified: Option<TypedDatetime>,
    pub extra: Map<String, Value>,
}

impl Edition {
    pub fn new(olid: Olid, work_olid: Option<Olid>) -> Self {
        Edition {
            olid,
            work_olid,
            title: None,
            subtitle: None,
            authors: Vec::new(),
            pages: None,
            publisher: None,
            publishers: Vec::new(),
            identifiers: Map::new(),
            covers: Vec::new(),
            description: None,
            notes: None,
            revision: None,
            last_modified: None,
            extra: Map::new(),
        }
    }

    /// Build an edition from its raw wire document plus its already-resolved
    /// authors (resolution happens in the client, which owns the HTTP
    /// session).
    ///
    /// The parent work is extracted from the first entry of the wire `works`
    /// list; the stub `authors` list is discarded in favor of the resolved
    /// records.
    pub fn from_document(
        olid: Olid,
        mut doc: Map<String, Value>,
        authors: Vec<Author>,
    ) -> Result<Self, DocumentError> {
        doc.remove("key");
        doc.remove("authors");
        let work_olid = take_field::<Vec<KeyRef>>(&mut doc, "works")?
            .and_then(|works| works.into_iter().next())
            .map(|stub| stub.olid())
            .transpose()?;
        let title = take_field(&mut doc, "title")?;
        let subtitle = take_field(&mut doc, "subtitle")?;
        let pages = take_field(&mut doc, "number_of_pages")?;
        let publisher = take_field(&mut doc, "publisher")?;
        let publishers = take_field(&mut doc, "publishers")?.unwrap_or_default();
        let identifiers = take_field(&mut doc, "identifiers")?.unwrap_or_default();
        let covers = take_field(&mut doc, "covers")?.unwrap_or_default();
        let description = take_field(&mut doc, "description")?;
        let notes = take_field(&mut doc, "notes")?;
        let revision = take_field(&mut doc, "revision")?;
        let last_modified = take_field(&mut doc, "last_modified")?;
        Ok(Edition {
            olid,
            work_olid,
            title,
            subtitle,
            authors,
            pages,
            publisher,
            publishers,
            identifiers,
            covers,
            description,
            notes,
            revision,
            last_modified,
            extra: doc,
        })
    }

    /// Validate the wire form of this record against the edition schema.
    ///
    /// An edition with no `work_olid` serializes without a `works` list and
    /// fails here.
    pub fn validate(&self) -> Result<(), ValidateError> {
        schema::validate_document(RecordKind::Edition, &self.to_json())
    }

    pub fn to_json(&self) -> Value {
        let mut out = strip_nulls(&self.extra);
        out.insert("key".into(), json!(self.olid.key()));
        out.insert("type".into(), json!({"key": RecordKind::Edition.type_key()}));
        if let Some(title) = &self.title {
            out.insert("title".into(), json!(title));
        }
        if let Some(subtitle) = &self.subtitle {
            out.insert("subtitle".into(), json!(subtitle));
        }
        if let Some(work_olid) = &self.work_olid {
            out.insert("works".into(), json!([KeyRef::from(work_olid)]));
        }
        if !self.authors.is_empty() {
            let stubs: Vec<KeyRef> = self.authors.iter().map(|a| KeyRef::from(&a.olid)).collect();
            out.insert("authors".into(), json!(stubs));
        }
        if let Some(pages) = self.pages {
            out.insert("number_of_pages".into(), json!(pages));
        }
        if let Some(publisher) = &self.publisher {
            out.insert("publisher".into(), json!(publisher));
        }
        if !self.publishers.is_empty() {
            out.insert("publishers".into(), json!(self.publishers));
        }
        if !self.identifiers.is_empty() {
            out.insert("identifiers".into(), Value::Object(self.identifiers.clone()));
        }
        if !self.covers.is_empty() {
            out.insert("covers".into(), json!(self.covers));
        }
        if let Some(description) = &self.description {
            out.insert("description".into(), json!(description));
        }
        if let Some(notes) = &self.notes {
            out.insert("notes".into(), json!(notes));
        }
        if let Some(revision) = self.revision {
            out.insert("revision".into(), json!(revision));
        }
        if let Some(last_modified) = &self.last_modified {
            out.insert("last_modified".into(), json!(last_modified));
        }
        Value::Object(out)
    }
}

impl Entity for Edition {
    fn to_json(&self) -> Value {
        Edition::to_json(self)
    }
}

/// Pseudo-record marking an existing record for deletion in a batched save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delete {
    pub olid: Olid,
}

impl Delete {
    pub fn new(olid: Olid) -> Self {
        Delete { olid }
    }
}

impl Entity for Delete {
    fn to_json(&self) -> Value {
        json!({
            "type": {"key": "/type/delete"},
            "key": self.olid.key(),
        })
    }
}

/// Pseudo-record redirecting one record to another, the result of a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub from: Olid,
    pub to: Olid,
}

impl Redirect {
    pub fn new(from: Olid, to: Olid) -> Self {
        Redirect { from, to }
    }
}

impl Entity for Redirect {
    fn to_json(&self) -> Value {
        json!({
            "type": {"key": "/type/redirect"},
            "key": self.from.key(),
            "location": self.to.key(),
        })
    }
}

/// Any of the three catalog records, as returned by kind-generic lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Work(Work),
    Edition(Edition),
    Author(Author),
}

impl Record {
    pub fn olid(&self) -> &Olid {
        match self {
            Record::Work(work) => &work.olid,
            Record::Edition(edition) => &edition.olid,
            Record::Author(author) => &author.olid,
        }
    }

    pub fn validate(&self) -> Result<(), ValidateError> {
        match self {
            Record::Work(work) => work.validate(),
            Record::Edition(edition) => edition.validate(),
            Record::Author(author) => author.validate(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Record::Work(work) => work.to_json(),
            Record::Edition(edition) => edition.to_json(),
            Record::Author(author) => author.to_json(),
        }
    }
}

impl Entity for Record {
    fn to_json(&self) -> Value {
        Record::to_json(self)
    }
}
