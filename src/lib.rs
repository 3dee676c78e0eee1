//! Client for the site datafeed entries REST API.
//!
//! - [`client`] - request construction, response handling, error types
//! - [`datafeed`] - the six entry operations (get/add/delete, single or batch)
//! - [`config`] - TOML configuration for the command-line front end

pub mod client;
pub mod config;
pub mod datafeed;
pub mod util;

pub use client::{ApiClient, ApiError, ClientSettings, ErrorKind};
pub use datafeed::{DataFeedService, Entry, EntryMap};
