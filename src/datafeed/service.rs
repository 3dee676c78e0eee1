use super::entry::{Entry, EntryMap};
use crate::client::{ApiClient, ApiError};
use reqwest::Method;

const API_VERSION: &str = "v1";

/// Operations on `v1/site-{site}/datafeeds/{feed}/entries[/{key}]`.
///
/// Each method issues exactly one request. Nothing is retried or cached, and
/// failures come back as the [`ApiError`] produced by the underlying client.
#[derive(Debug, Clone, Copy)]
pub struct DataFeedService<'a> {
    client: &'a ApiClient,
}

impl<'a> DataFeedService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    fn entries_path(&self, feed_prefix: &str) -> Vec<String> {
        vec![
            API_VERSION.to_string(),
            format!("site-{}", self.client.site_id()),
            "datafeeds".to_string(),
            feed_prefix.to_string(),
            "entries".to_string(),
        ]
    }

    fn entry_path(&self, feed_prefix: &str, key: &str) -> Vec<String> {
        let mut path = self.entries_path(feed_prefix);
        path.push(key.to_string());
        path
    }

    /// Fetches several entries at once.
    ///
    /// Keys are sent as a single comma-joined `key` query parameter in the
    /// order given. An empty slice still sends `key=`.
    pub async fn get_entries<S: AsRef<str>>(
        &self,
        feed_prefix: &str,
        keys: &[S],
    ) -> Result<EntryMap, ApiError> {
        tracing::debug!(feed = feed_prefix, keys = keys.len(), "Fetching datafeed entries");
        let joined = join_keys(keys);
        let request = self.client.new_request(
            Method::GET,
            &self.entries_path(feed_prefix),
            &[("key", joined.as_str())],
        )?;
        self.client.execute_json(request).await
    }

    /// Posts `entries` as a JSON array. An empty slice still posts `[]`.
    pub async fn add_entries(&self, feed_prefix: &str, entries: &[Entry]) -> Result<(), ApiError> {
        tracing::debug!(feed = feed_prefix, entries = entries.len(), "Adding datafeed entries");
        let request = self
            .client
            .new_request(Method::POST, &self.entries_path(feed_prefix), &[])?;
        let request = ApiClient::json_body(request, entries)?;
        self.client.execute(request).await?;
        Ok(())
    }

    pub async fn delete_entries<S: AsRef<str>>(
        &self,
        feed_prefix: &str,
        keys: &[S],
    ) -> Result<(), ApiError> {
        tracing::debug!(feed = feed_prefix, keys = keys.len(), "Deleting datafeed entries");
        let joined = join_keys(keys);
        let request = self.client.new_request(
            Method::DELETE,
            &self.entries_path(feed_prefix),
            &[("key", joined.as_str())],
        )?;
        self.client.execute(request).await?;
        Ok(())
    }

    pub async fn get_entry(&self, feed_prefix: &str, key: &str) -> Result<EntryMap, ApiError> {
        tracing::debug!(feed = feed_prefix, key = key, "Fetching datafeed entry");
        let request = self
            .client
            .new_request(Method::GET, &self.entry_path(feed_prefix, key), &[])?;
        self.client.execute_json(request).await
    }

    /// Stores one entry: `ttl` goes in the query string, `values` is the body.
    pub async fn add_entry(&self, feed_prefix: &str, entry: &Entry) -> Result<(), ApiError> {
        tracing::debug!(feed = feed_prefix, key = %entry.key, ttl = entry.ttl, "Adding datafeed entry");
        let ttl = entry.ttl.to_string();
        let request = self.client.new_request(
            Method::POST,
            &self.entry_path(feed_prefix, &entry.key),
            &[("ttl", ttl.as_str())],
        )?;
        let request = ApiClient::json_body(request, &entry.values)?;
        self.client.execute(request).await?;
        Ok(())
    }

    pub async fn delete_entry(&self, feed_prefix: &str, key: &str) -> Result<(), ApiError> {
        tracing::debug!(feed = feed_prefix, key = key, "Deleting datafeed entry");
        let request = self
            .client
            .new_request(Method::DELETE, &self.entry_path(feed_prefix, key), &[])?;
        self.client.execute(request).await?;
        Ok(())
    }
}

/// Joins keys with `,` preserving order. Keys are not escaped or checked.
fn join_keys<S: AsRef<str>>(keys: &[S]) -> String {
    keys.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",")
}
