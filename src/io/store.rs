//! Remote JSON document store access.
//!
//! Records live under collection paths (`tasks`, `users`) keyed by a
//! store-assigned id. Every request URL is `{base_url}/{path}{suffix}`; the
//! suffix selects the JSON serialization of the backend (`.json` by default).

use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;

/// Error type for remote store calls
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{method} {url} failed with HTTP {status}")]
    Status {
        method: &'static str,
        status: u16,
        url: String,
    },
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: &'static str,
        url: String,
        source: reqwest::Error,
    },
    #[error("{method} {url} returned invalid JSON: {source}")]
    Decode {
        method: &'static str,
        url: String,
        source: serde_json::Error,
    },
    #[error("create at {url} returned no record id")]
    MissingId { url: String },
    #[error("could not build HTTP client: {0}")]
    Client(reqwest::Error),
}

/// CRUD against the remote store. Writes propagate failures; `read`
/// degrades them to `None`.
pub trait DocumentStore {
    /// Add `record` to `collection`; returns the id the store assigned.
    fn create(&self, collection: &str, record: &Value) -> Result<String, StoreError>;
    /// The document at `path`, or None if absent or unreachable.
    fn read(&self, path: &str) -> Option<Value>;
    /// Overwrite `path/id` with `record`.
    fn replace(&self, path: &str, id: &str, record: &Value) -> Result<Value, StoreError>;
    /// Merge `partial` into `path/id`.
    fn patch(&self, path: &str, id: &str, partial: &Value) -> Result<Value, StoreError>;
    /// Delete the document at `path`.
    fn remove(&self, path: &str) -> Result<bool, StoreError>;
}

/// Strip leading slashes so paths join cleanly onto the base URL.
pub fn normalize_path(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// `collection/id`, normalized.
pub fn record_path(collection: &str, id: &str) -> String {
    format!("{}/{}", normalize_path(collection).trim_end_matches('/'), id)
}

/// [`DocumentStore`] over HTTP with REST verbs.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
    suffix: String,
}

impl HttpStore {
    pub fn new(base_url: &str, suffix: &str) -> Result<Self, StoreError> {
        let client = Client::builder().build().map_err(StoreError::Client)?;
        Ok(HttpStore {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// Resolved URL for a store path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}{}", self.base_url, normalize_path(path), self.suffix)
    }

    fn send(&self, method: &'static str, url: &str, rb: RequestBuilder) -> Result<Value, StoreError> {
        tracing::debug!(method, url, "store request");
        let resp = rb.send().map_err(|source| StoreError::Transport {
            method,
            url: url.to_string(),
            source,
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                method,
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.text().map_err(|source| StoreError::Transport {
            method,
            url: url.to_string(),
            source,
        })?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|source| StoreError::Decode {
            method,
            url: url.to_string(),
            source,
        })
    }
}

impl DocumentStore for HttpStore {
    fn create(&self, collection: &str, record: &Value) -> Result<String, StoreError> {
        let url = self.url(collection);
        let created = self.send("POST", &url, self.client.post(&url).json(record))?;
        // The backend answers `{"name": "<id>"}`; some deployments use `id`
        created
            .get("name")
            .or_else(|| created.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(StoreError::MissingId { url })
    }

    fn read(&self, path: &str) -> Option<Value> {
        let url = self.url(path);
        match self.send("GET", &url, self.client.get(&url)) {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "store read failed, treating as absent");
                None
            }
        }
    }

    fn replace(&self, path: &str, id: &str, record: &Value) -> Result<Value, StoreError> {
        let url = self.url(&record_path(path, id));
        self.send("PUT", &url, self.client.put(&url).json(record))
    }

    fn patch(&self, path: &str, id: &str, partial: &Value) -> Result<Value, StoreError> {
        let url = self.url(&record_path(path, id));
        self.send("PATCH", &url, self.client.patch(&url).json(partial))
    }

    fn remove(&self, path: &str) -> Result<bool, StoreError> {
        let url = self.url(path);
        self.send("DELETE", &url, self.client.delete(&url))?;
        Ok(true)
    }
}
