//! HTTP plumbing shared by every API resource.
//!
//! [`ApiClient`] owns the injected `reqwest::Client`, the validated base URL,
//! the site identifier and optional basic-auth credentials. Resources build
//! requests with [`ApiClient::new_request`] and send them through
//! [`ApiClient::execute`] or [`ApiClient::execute_json`].

mod error;

pub use error::{ApiError, ErrorKind};

use crate::datafeed::DataFeedService;
use crate::util::validate_base_url;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

/// Largest response body the client will buffer (10 MB).
pub const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Bytes of an error response body kept in [`ApiError::HttpStatus`].
const ERROR_BODY_EXCERPT: usize = 1024;

pub const DEFAULT_USER_AGENT: &str = concat!("datafeed/", env!("CARGO_PKG_VERSION"));

/// Everything needed to address the API on behalf of one site.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub site_id: String,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub user_agent: String,
}

impl ClientSettings {
    pub fn new(base_url: impl Into<String>, site_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            site_id: site_id.into(),
            username: None,
            password: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: Option<SecretString>) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }
}

struct Credentials {
    username: String,
    password: Option<SecretString>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    site_id: String,
    credentials: Option<Credentials>,
    user_agent: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("site_id", &self.site_id)
            .field(
                "username",
                &self.credentials.as_ref().map(|c| c.username.as_str()),
            )
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client around an existing `reqwest::Client`.
    ///
    /// Timeouts, proxies and TLS settings belong to `http`; this layer adds
    /// none of its own.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidBaseUrl`] if the base URL is not http(s),
    /// cannot hold a path, or would send credentials over plain HTTP to a
    /// non-local host.
    pub fn new(http: reqwest::Client, settings: ClientSettings) -> Result<Self, ApiError> {
        let credentials = settings.username.map(|username| Credentials {
            username,
            password: settings.password,
        });
        let base_url = validate_base_url(&settings.base_url, credentials.is_some())?;

        tracing::debug!(
            base_url = %base_url,
            site_id = %settings.site_id,
            authenticated = credentials.is_some(),
            "API client configured"
        );

        Ok(Self {
            http,
            base_url,
            site_id: settings.site_id,
            credentials,
            user_agent: settings.user_agent,
        })
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    /// Accessor for the datafeed entries resource of this client's site.
    pub fn datafeeds(&self) -> DataFeedService<'_> {
        DataFeedService::new(self)
    }

    /// Resolves `segments` against the base URL and appends `query` pairs.
    ///
    /// Each segment is percent-encoded on its own, so a `/` inside a key
    /// never introduces an extra path level. `.` and `..` are rejected with
    /// [`ApiError::InvalidPathSegment`]: URL normalization would drop them and
    /// address a different resource.
    pub fn endpoint<S: AsRef<str>>(
        &self,
        segments: &[S],
        query: &[(&str, &str)],
    ) -> Result<Url, ApiError> {
        if let Some(dot) = segments
            .iter()
            .map(AsRef::as_ref)
            .find(|s| matches!(*s, "." | ".."))
        {
            return Err(ApiError::InvalidPathSegment(dot.to_string()));
        }

        let mut url = self.base_url.clone();
        // cannot_be_a_base URLs are rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Starts a request with the default headers and credentials attached.
    pub fn new_request<S: AsRef<str>>(
        &self,
        method: Method,
        segments: &[S],
        query: &[(&str, &str)],
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments, query)?;
        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, self.user_agent.as_str());

        if let Some(creds) = &self.credentials {
            request = request.basic_auth(
                &creds.username,
                creds.password.as_ref().map(|p| p.expose_secret()),
            );
        }
        Ok(request)
    }

    /// Serializes `body` as the JSON payload of `request`.
    pub fn json_body<T: Serialize + ?Sized>(
        request: RequestBuilder,
        body: &T,
    ) -> Result<RequestBuilder, ApiError> {
        let bytes = serde_json::to_vec(body).map_err(ApiError::Encode)?;
        Ok(request.header(CONTENT_TYPE, "application/json").body(bytes))
    }

    /// Sends `request` and returns the raw response body of a 2xx reply.
    ///
    /// Non-2xx replies become [`ApiError::HttpStatus`] with the status code
    /// and the start of the body preserved.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let request = request.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        tracing::debug!(method = %method, path = %path, "Sending API request");

        let response = self.http.execute(request).await.map_err(|e| {
            tracing::warn!(method = %method, path = %path, error = %e, "API request failed");
            ApiError::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = match read_limited_body(response, MAX_RESPONSE_SIZE).await {
                Ok(bytes) => excerpt(&bytes),
                Err(_) => String::new(),
            };
            tracing::warn!(
                method = %method,
                path = %path,
                status = status.as_u16(),
                "API request returned error status"
            );
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = read_limited_body(response, MAX_RESPONSE_SIZE).await?;
        tracing::trace!(status = status.as_u16(), bytes = body.len(), "API response received");
        Ok(body)
    }

    /// Sends `request` and decodes the JSON body of a 2xx reply.
    ///
    /// An empty (or whitespace-only) body decodes to `T::default()`.
    pub async fn execute_json<T>(&self, request: RequestBuilder) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Default,
    {
        let body = self.execute(request).await?;
        decode_body(&body)
    }
}

fn decode_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(ApiError::Decode)
}

fn excerpt(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let cut = text.char_indices().nth(ERROR_BODY_EXCERPT).map(|(idx, _)| idx);
    match cut {
        Some(idx) => text[..idx].to_string(),
        None => text.into_owned(),
    }
}

async fn read_limited_body(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
