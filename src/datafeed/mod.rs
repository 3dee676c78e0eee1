//! Datafeed entries resource.
//!
//! A datafeed is a named key-value namespace (the feed prefix) under a site.
//! Entries carry free-form JSON values and a server-side ttl.
//!
//! # Example
//!
//! ```ignore
//! let client = ApiClient::new(reqwest::Client::new(), ClientSettings::new(base, "abc"))?;
//! let feeds = client.datafeeds();
//!
//! feeds.add_entry("users", &Entry::new("u1", 3600).with_value("name", "Alice")).await?;
//! let entry = feeds.get_entry("users", "u1").await?;
//! ```

mod entry;
mod service;

pub use entry::{Entry, EntryMap};
pub use service::DataFeedService;
