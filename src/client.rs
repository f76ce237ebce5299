//! The HTTP client: session setup, chained lookups, and batched writes.
//!
//! One [`OpenLibrary`] value owns the session (base URL plus cookie jar) and
//! is threaded explicitly into every operation that touches the network.
//! All I/O is blocking and sequential; a lookup is a strict chain of
//! dependent round-trips. Retries are not this crate's concern.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::book::Book;
use crate::entities::{Author, Edition, Entity, Record, Work};
use crate::error::{ClientError, DocumentError};
use crate::types::{json_type_name, KeyRef, Olid, RecordKind};

/// Default timeout for HTTP requests (10 seconds).
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// The public catalog service.
pub const DEFAULT_BASE_URL: &str = "https://openlibrary.org";

/// Sentinel the creation endpoint accepts for an author the catalog does not
/// know yet.
const NEW_AUTHOR_KEY: &str = "__new__";

/// Connection settings for [`OpenLibrary`].
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: HTTP_TIMEOUT,
        }
    }
}

impl Config {
    /// Settings from the environment: `OL_BASE_URL` overrides the public
    /// service.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Ok(base_url) = std::env::var("OL_BASE_URL") {
            config.base_url = base_url;
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Account credentials for write access.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// A session against one catalog service.
///
/// Reads work anonymously ([`OpenLibrary::new`]); writes need the session
/// cookie from [`OpenLibrary::login`]. The underlying blocking client is
/// whatever reqwest makes of concurrent reuse; one session, serialized use,
/// is the supported mode.
pub struct OpenLibrary {
    base_url: String,
    http: Client,
}

impl OpenLibrary {
    /// Anonymous session; enough for every read operation.
    pub fn new(config: Config) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let http = Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .build()
            .map_err(|source| ClientError::Network {
                url: base_url.clone(),
                source,
            })?;
        Ok(OpenLibrary { base_url, http })
    }

    /// Authenticated session: logs in once and keeps the session cookie for
    /// all subsequent calls.
    ///
    /// # Errors
    ///
    /// `ClientError::LoginRejected` when the service answers without setting
    /// a session cookie; transport failures as `ClientError::Network`.
    pub fn login(config: Config, credentials: &Credentials) -> Result<Self, ClientError> {
        let client = Self::new(config)?;
        let url = format!("{}/account/login", client.base_url);
        debug!(%url, "logging in");
        let response = client
            .http
            .post(&url)
            .json(credentials)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|source| ClientError::Network {
                url: url.clone(),
                source,
            })?;
        if !response.headers().contains_key(reqwest::header::SET_COOKIE) {
            return Err(ClientError::LoginRejected { url });
        }
        info!(username = %credentials.username, "logged in");
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, ClientError> {
        debug!(%url, "GET");
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|source| ClientError::Network {
                url: url.to_string(),
                source,
            })?;
        response.json().map_err(|source| ClientError::Network {
            url: url.to_string(),
            source,
        })
    }

    /// Fetch any record by identifier, dispatching on the OLID suffix.
    pub fn get(&self, olid: &Olid) -> Result<Record, ClientError> {
        match olid.kind() {
            RecordKind::Work => self.get_work(olid).map(Record::Work),
            RecordKind::Edition => self.get_edition(olid).map(Record::Edition),
            RecordKind::Author => self.get_author(olid).map(Record::Author),
        }
    }

    fn fetch_document(&self, olid: &Olid) -> Result<(String, Map<String, Value>), ClientError> {
        let url = format!("{}{}.json", self.base_url, olid.key());
        let value = self.get_json(&url, &[])?;
        let doc = into_object(value, &url)?;
        Ok((url, doc))
    }

    pub fn get_work(&self, olid: &Olid) -> Result<Work, ClientError> {
        let (_, doc) = self.fetch_document(olid)?;
        Ok(Work::from_document(olid.clone(), doc)?)
    }

    pub fn get_author(&self, olid: &Olid) -> Result<Author, ClientError> {
        let (_, doc) = self.fetch_document(olid)?;
        Ok(Author::from_document(olid.clone(), doc)?)
    }

    /// Fetch an edition and expand its author stubs into full records, one
    /// further lookup per author, in the order the service lists them.
    pub fn get_edition(&self, olid: &Olid) -> Result<Edition, ClientError> {
        let (url, mut doc) = self.fetch_document(olid)?;
        let stubs: Vec<KeyRef> = match doc.remove("authors") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => {
                serde_json::from_value(value).map_err(|e| ClientError::MalformedResponse {
                    url: url.clone(),
                    message: format!("authors: {e}"),
                })?
            }
        };
        let mut authors = Vec::with_capacity(stubs.len());
        for stub in stubs {
            let author_olid = stub.olid().map_err(DocumentError::from)?;
            authors.push(self.get_author(&author_olid)?);
        }
        Ok(Edition::from_document(olid.clone(), doc, authors)?)
    }

    /// Resolve an external identifier to an OLID via the bib-key endpoint.
    ///
    /// A key the service does not know is `Ok(None)`, a valid empty result;
    /// transport errors always propagate.
    pub fn olid_by_bibkey(&self, scheme: &str, value: &str) -> Result<Option<Olid>, ClientError> {
        let bibkey = format!("{scheme}:{value}");
        let url = format!("{}/api/books.json", self.base_url);
        let response = self.get_json(&url, &[("bibkeys", bibkey.as_str())])?;
        let matches = into_object(response, &url)?;
        let Some(entry) = matches.get(&bibkey) else {
            return Ok(None);
        };
        let info_url = entry.get("info_url").and_then(Value::as_str).ok_or_else(|| {
            ClientError::MalformedResponse {
                url: url.clone(),
                message: format!("match for {bibkey} has no info_url"),
            }
        })?;
        let olid = Olid::scan(info_url).ok_or_else(|| ClientError::MalformedResponse {
            url: url.clone(),
            message: format!("no olid in info_url {info_url}"),
        })?;
        Ok(Some(olid))
    }

    pub fn olid_by_isbn(&self, isbn: &str) -> Result<Option<Olid>, ClientError> {
        self.olid_by_bibkey("ISBN", isbn)
    }

    /// ISBN to fully-expanded edition: bib-key resolve, then record fetch,
    /// then author expansion.
    pub fn edition_by_isbn(&self, isbn: &str) -> Result<Option<Edition>, ClientError> {
        match self.olid_by_isbn(isbn)? {
            Some(olid) => self.get_edition(&olid).map(Some),
            None => Ok(None),
        }
    }

    /// Title search, returning the first (best) match built from its key and
    /// title.
    pub fn search_work(&self, title: &str) -> Result<Option<Work>, ClientError> {
        let url = format!("{}/search.json", self.base_url);
        let response = self.get_json(&url, &[("title", title)])?;
        let mut results = into_object(response, &url)?;
        let docs = match results.remove("docs") {
            Some(Value::Array(docs)) => docs,
            _ => Vec::new(),
        };
        let Some(doc) = docs.into_iter().next() else {
            return Ok(None);
        };
        let key = doc.get("key").and_then(Value::as_str).ok_or_else(|| {
            ClientError::MalformedResponse {
                url: url.clone(),
                message: "search doc has no key".to_string(),
            }
        })?;
        let mut work = Work::new(Olid::from_key(key).map_err(DocumentError::from)?);
        work.title = doc.get("title").and_then(Value::as_str).map(String::from);
        Ok(Some(work))
    }

    /// Author name to OLID via the autocomplete endpoint (not the general
    /// search endpoint), limited to the single best match.
    pub fn author_olid_by_name(&self, name: &str) -> Result<Option<Olid>, ClientError> {
        let url = format!("{}/authors/_autocomplete", self.base_url);
        let response = self.get_json(&url, &[("q", name), ("limit", "1")])?;
        let matches = match response {
            Value::Array(matches) => matches,
            other => {
                return Err(ClientError::MalformedResponse {
                    url,
                    message: format!("expected array, got {}", json_type_name(&other)),
                })
            }
        };
        let Some(entry) = matches.into_iter().next() else {
            return Ok(None);
        };
        let key = entry.get("key").and_then(Value::as_str).ok_or_else(|| {
            ClientError::MalformedResponse {
                url,
                message: "autocomplete match has no key".to_string(),
            }
        })?;
        Ok(Some(Olid::from_key(key).map_err(DocumentError::from)?))
    }

    /// Build the record-creation payload without submitting it: the dry run.
    ///
    /// Resolves the primary author's name through the autocomplete endpoint;
    /// an unmatched name becomes the creation endpoint's `__new__` sentinel.
    /// [`OpenLibrary::create_book`] submits exactly this payload.
    pub fn create_book_payload(&self, book: &Book) -> Result<Map<String, Value>, ClientError> {
        let author = book.primary_author().ok_or(ClientError::NoAuthor)?;
        let (id_name, id_value) = book.primary_identifier()?;
        let author_key = match self.author_olid_by_name(&author.name)? {
            Some(olid) => olid.key(),
            None => NEW_AUTHOR_KEY.to_string(),
        };

        let mut payload = Map::new();
        payload.insert("_save".into(), json!(""));
        payload.insert("author_key".into(), json!(author_key));
        payload.insert("author_name".into(), json!(author.name));
        payload.insert("id_name".into(), json!(id_name));
        payload.insert("id_value".into(), json!(id_value));
        if let Some(publish_date) = &book.publish_date {
            payload.insert("publish_date".into(), json!(publish_date));
        }
        if let Some(publisher) = &book.publisher {
            payload.insert("publisher".into(), json!(publisher));
        }
        payload.insert("title".into(), json!(book.title));
        Ok(payload)
    }

    /// Create a new catalog record from caller-supplied book metadata.
    pub fn create_book(&self, book: &Book) -> Result<(), ClientError> {
        let payload = self.create_book_payload(book)?;
        let url = format!("{}/books/add", self.base_url);
        debug!(%url, "POST");
        self.http
            .post(&url)
            .form(&payload)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|source| ClientError::Network {
                url: url.clone(),
                source,
            })?;
        Ok(())
    }

    /// Save a batch of records in one call.
    ///
    /// Every record is serialized via [`Entity::to_json`] and the whole
    /// batch goes out as a single JSON array; exactly one network call is
    /// made regardless of batch size. The `Opt` header carries the `ns=42`
    /// extension marker and `42-comment` the audit comment.
    pub fn save_many<'a, I>(&self, documents: I, comment: &str) -> Result<(), ClientError>
    where
        I: IntoIterator<Item = &'a dyn Entity>,
    {
        let batch: Vec<Value> = documents.into_iter().map(|doc| doc.to_json()).collect();
        let url = format!("{}/api/save_many", self.base_url);
        debug!(%url, records = batch.len(), "POST");
        self.http
            .post(&url)
            .json(&batch)
            .header("Opt", format!("\"{}/dicts/1\" ; ns=42", self.base_url))
            .header("42-comment", comment)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|source| ClientError::Network {
                url: url.clone(),
                source,
            })?;
        Ok(())
    }
}

fn into_object(value: Value, url: &str) -> Result<Map<String, Value>, ClientError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ClientError::MalformedResponse {
            url: url.to_string(),
            message: format!("expected object, got {}", json_type_name(&other)),
        }),
    }
}
