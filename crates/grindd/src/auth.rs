//! Admin bearer-token gate
//!
//! Admin routes require `Authorization: Bearer <secret>`. A missing header
//! or one without the `Bearer ` prefix is a 401; a wrong token is a 403.

use axum::http::{header, HeaderMap};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,

    #[error("invalid bearer token")]
    Invalid,
}

/// Token from a `Bearer <token>` Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Check the request carries the admin secret
pub fn authorize(headers: &HeaderMap, secret: &str) -> Result<(), AuthError> {
    let Some(token) = bearer_token(headers) else {
        warn!("Admin request without bearer token");
        return Err(AuthError::Missing);
    };

    if !constant_time_eq(token.as_bytes(), secret.as_bytes()) {
        warn!("Admin request with invalid token: {}", mask_token(token));
        return Err(AuthError::Invalid);
    }

    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Mask token for logging (show first 8 chars only)
pub fn mask_token(token: &str) -> String {
    match token.char_indices().nth(8) {
        Some((idx, _)) => format!("{}...", &token[..idx]),
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(authorize(&HeaderMap::new(), "secret"), Err(AuthError::Missing));
    }

    #[test]
    fn test_non_bearer_scheme() {
        assert_eq!(authorize(&headers_with("Basic c2VjcmV0"), "secret"), Err(AuthError::Missing));
        assert_eq!(authorize(&headers_with("secret"), "secret"), Err(AuthError::Missing));
    }

    #[test]
    fn test_wrong_token() {
        assert_eq!(authorize(&headers_with("Bearer nope"), "secret"), Err(AuthError::Invalid));
        assert_eq!(authorize(&headers_with("Bearer "), "secret"), Err(AuthError::Invalid));
        assert_eq!(authorize(&headers_with("Bearer secret "), "secret"), Err(AuthError::Invalid));
    }

    #[test]
    fn test_correct_token() {
        assert_eq!(authorize(&headers_with("Bearer secret"), "secret"), Ok(()));
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers_with("Bearer abc def")), Some("abc def"));
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "***");
        assert_eq!(mask_token("12345678"), "***");
        assert_eq!(mask_token("1234567890abcdef"), "12345678...");
    }
}
