use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur while validating the API base URL.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("{0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL cannot carry path segments (e.g. `data:` style URLs).
    #[error("URL cannot be used as a base for request paths")]
    CannotBeABase,
    /// Credentials would travel over plain HTTP to a non-local host.
    #[error("HTTPS required when credentials are configured (except localhost)")]
    InsecureScheme,
}

/// Validates the base URL that all API paths are resolved against.
///
/// Only `http` and `https` are accepted. When `sends_credentials` is set,
/// plain `http` is rejected unless the host is localhost or a loopback
/// address, so basic-auth headers are never sent in clear text to a remote
/// host.
///
/// # Examples
///
/// ```
/// use datafeed::util::validate_base_url;
///
/// assert!(validate_base_url("https://api.example.com/", true).is_ok());
/// assert!(validate_base_url("http://127.0.0.1:8080", true).is_ok());
/// assert!(validate_base_url("http://api.example.com", true).is_err());
/// assert!(validate_base_url("ftp://example.com", false).is_err());
/// ```
pub fn validate_base_url(url_str: &str, sends_credentials: bool) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "https" => {}
        "http" => {
            if sends_credentials && !is_localhost(&url) {
                tracing::error!(base_url = %url, "Rejecting non-HTTPS base URL with credentials configured");
                return Err(UrlValidationError::InsecureScheme);
            }
        }
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.cannot_be_a_base() {
        return Err(UrlValidationError::CannotBeABase);
    }

    Ok(url)
}

fn is_localhost(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    if host == "localhost" {
        return true;
    }

    // Strip brackets from IPv6 addresses for parsing
    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    host_for_parse
        .parse::<IpAddr>()
        .is_ok_and(|ip| ip.is_loopback())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_accepted() {
        assert!(validate_base_url("https://api.example.com/", true).is_ok());
        assert!(validate_base_url("https://api.example.com:8443/prefix", false).is_ok());
    }

    #[test]
    fn test_invalid_schemes() {
        assert!(matches!(
            validate_base_url("ftp://example.com", false),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            validate_base_url("file:///etc/passwd", false),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_unparseable_rejected() {
        assert!(matches!(
            validate_base_url("not a url", false),
            Err(UrlValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_plain_http_without_credentials_allowed() {
        assert!(validate_base_url("http://api.example.com", false).is_ok());
    }

    #[test]
    fn test_plain_http_with_credentials_rejected() {
        assert!(matches!(
            validate_base_url("http://api.example.com", true),
            Err(UrlValidationError::InsecureScheme)
        ));
    }

    #[test]
    fn test_localhost_http_with_credentials_allowed() {
        assert!(validate_base_url("http://localhost:3000", true).is_ok());
        assert!(validate_base_url("http://127.0.0.1:3000", true).is_ok());
        assert!(validate_base_url("http://[::1]:3000", true).is_ok());
    }

    #[test]
    fn test_private_ip_is_not_localhost() {
        assert!(validate_base_url("http://192.168.1.1", true).is_err());
    }
}
