//! Blocking HTTP fetcher for the rating API
//!
//! Issues plain GET requests against the API root and decodes the body as
//! untyped JSON. Numeric fields the API sends as strings stay strings.

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;

/// Default root of the rating API
pub const DEFAULT_BASE_URL: &str = "https://rating.chgk.info/api";

/// Fetches JSON documents from the rating API
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    base_url: String,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Fetcher {
    /// Creates a fetcher for the given API root
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Creates a fetcher with a custom HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The API root requests are resolved against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the absolute URL for a path relative to the API root
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GETs `path` with the given query parameters and decodes the JSON body
    ///
    /// # Returns
    /// * `Ok(Value)` - the decoded body, untouched
    /// * `Err(FetchError::Request)` - network failure
    /// * `Err(FetchError::Status)` - non-success HTTP status
    /// * `Err(FetchError::Parse)` - body is not valid JSON
    pub fn fetch(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, FetchError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self.client.get(&url).query(params).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let text = response.text()?;
        let value = serde_json::from_str(&text)?;
        Ok(value)
    }
}
