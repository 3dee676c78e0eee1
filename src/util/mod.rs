//! Utility functions shared by the client and the command-line front end.
//!
//! - **URL validation**: base URL checks run before any request is built

mod url_validator;

pub use url_validator::{validate_base_url, UrlValidationError};
