//! Explicit session context.
//!
//! The visitor's API token is opaque to the storefront: it is forwarded to the
//! backend as a bearer token and never decoded. The context is passed into the
//! API client explicitly instead of being read from ambient storage.

use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use secrecy::{ExposeSecret, SecretString};

/// Session state for one visitor.
#[derive(Clone, Default)]
pub struct SessionContext {
    token: Option<SecretString>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl SessionContext {
    /// A visitor without a session.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A visitor holding an API token. Blank tokens count as no session.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.trim().is_empty() {
            return Self::anonymous();
        }
        Self {
            token: Some(SecretString::from(token)),
        }
    }

    /// Extract the token from `Authorization: Bearer …`, falling back to the
    /// named cookie.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Self {
        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);

        if let Some(token) = bearer {
            return Self::with_token(token);
        }

        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == cookie_name)
            .map_or_else(Self::anonymous, |(_, value)| Self::with_token(value))
    }

    /// Whether a token is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The raw token, for building the `Authorization` header.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_ref().map(|token| token.expose_secret())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_blank_token_is_anonymous() {
        assert!(!SessionContext::with_token("  ").is_authenticated());
        assert!(SessionContext::with_token("abc").is_authenticated());
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = SessionContext::with_token("super-secret-token");
        let debug_output = format!("{session:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret-token"));
    }

    #[test]
    fn test_from_headers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok-1"));
        headers.insert(COOKIE, HeaderValue::from_static("access_token=tok-2"));

        let session = SessionContext::from_headers(&headers, "access_token");
        assert_eq!(session.bearer_token(), Some("tok-1"));
    }

    #[test]
    fn test_from_headers_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; access_token=tok-2; lang=vi"),
        );

        let session = SessionContext::from_headers(&headers, "access_token");
        assert_eq!(session.bearer_token(), Some("tok-2"));
    }

    #[test]
    fn test_from_headers_none() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));

        let session = SessionContext::from_headers(&headers, "access_token");
        assert!(!session.is_authenticated());
    }
}
