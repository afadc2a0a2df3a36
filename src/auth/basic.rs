//! HTTP Basic-Auth credential extraction

use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine as _};

const BASIC_PREFIX: &str = "Basic ";

/// Username and secret supplied in an `Authorization: Basic` header
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub secret: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl BasicCredentials {
    /// Extract credentials from request headers
    ///
    /// Returns `None` when the header is absent or is not a well-formed
    /// Basic-Auth value.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        Self::parse(value)
    }

    /// Parse an `Authorization` header value
    pub fn parse(value: &str) -> Option<Self> {
        // Scheme is case-insensitive
        if value.len() < BASIC_PREFIX.len()
            || !value.is_char_boundary(BASIC_PREFIX.len())
            || !value[..BASIC_PREFIX.len()].eq_ignore_ascii_case(BASIC_PREFIX)
        {
            return None;
        }

        let decoded = STANDARD.decode(value[BASIC_PREFIX.len()..].trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, secret) = decoded.split_once(':')?;

        Some(Self {
            username: username.to_string(),
            secret: secret.to_string(),
        })
    }

    /// Encode as an `Authorization` header value
    pub fn to_header_value(&self) -> String {
        format!(
            "{}{}",
            BASIC_PREFIX,
            STANDARD.encode(format!("{}:{}", self.username, self.secret))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_parse_basic() {
        // "alice:wonder:land"
        let creds = BasicCredentials::parse("Basic YWxpY2U6d29uZGVyOmxhbmQ=").unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.secret, "wonder:land");
    }

    #[test]
    fn test_scheme_case_insensitive() {
        let creds = BasicCredentials::parse("bAsIc Ym9iOmJ1aWxkZXI=").unwrap();
        assert_eq!(creds.username, "bob");
        assert_eq!(creds.secret, "builder");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(BasicCredentials::parse("Bearer abc").is_none());
        assert!(BasicCredentials::parse("Basic").is_none());
        assert!(BasicCredentials::parse("Basic !!!notbase64").is_none());
        // "nocolon"
        assert!(BasicCredentials::parse("Basic bm9jb2xvbg==").is_none());
    }

    #[test]
    fn test_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(BasicCredentials::from_headers(&headers).is_none());

        let creds = BasicCredentials {
            username: "carol".into(),
            secret: "pw".into(),
        };
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&creds.to_header_value()).unwrap(),
        );
        assert_eq!(BasicCredentials::from_headers(&headers), Some(creds));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = BasicCredentials {
            username: "carol".into(),
            secret: "hunter2".into(),
        };
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
