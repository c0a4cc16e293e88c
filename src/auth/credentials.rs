//! Credential extraction from request headers
//!
//! Two credential forms are accepted: an API key in the `X-API-Key` header
//! and a bearer token in the `Authorization` header. When both are present
//! the API key takes precedence.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

/// Header carrying an API key credential
pub const API_KEY_HEADER: &str = "x-api-key";

/// A credential presented by a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Bearer token from the Authorization header
    Bearer(String),
    /// API key from the X-API-Key header
    ApiKey(String),
}

impl Credential {
    /// Extract a credential from request headers
    ///
    /// Returns `None` when neither header is present, the Authorization
    /// scheme is not `Bearer`, or the credential value is empty.
    pub fn from_headers(headers: &HeaderMap) -> Option<Credential> {
        if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
            if !key.is_empty() {
                return Some(Credential::ApiKey(key.to_string()));
            }
        }

        let auth = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())?;
        let token = auth.strip_prefix("Bearer ")?.trim();
        if token.is_empty() {
            return None;
        }
        Some(Credential::Bearer(token.to_string()))
    }

    /// Authentication method name, for logging
    pub fn method(&self) -> &'static str {
        match self {
            Credential::Bearer(_) => "bearer",
            Credential::ApiKey(_) => "api_key",
        }
    }

    /// Short redacted preview safe for log output
    pub fn redacted(&self) -> String {
        let value = match self {
            Credential::Bearer(token) => token,
            Credential::ApiKey(key) => key,
        };
        let prefix: String = value.chars().take(6).collect();
        format!("{}...", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    // Test 1: Bearer token is extracted from the Authorization header
    #[test]
    fn test_bearer_extraction() {
        let h = headers(&[("authorization", "Bearer tok_abc")]);
        assert_eq!(
            Credential::from_headers(&h),
            Some(Credential::Bearer("tok_abc".to_string()))
        );
    }

    // Test 2: API key is extracted from X-API-Key
    #[test]
    fn test_api_key_extraction() {
        let h = headers(&[("x-api-key", "sk_123")]);
        assert_eq!(
            Credential::from_headers(&h),
            Some(Credential::ApiKey("sk_123".to_string()))
        );
    }

    // Test 3: API key takes precedence when both headers are present
    #[test]
    fn test_api_key_precedence() {
        let h = headers(&[("authorization", "Bearer tok_abc"), ("x-api-key", "sk_123")]);
        assert_eq!(
            Credential::from_headers(&h),
            Some(Credential::ApiKey("sk_123".to_string()))
        );
    }

    // Test 4: Non-Bearer Authorization schemes are rejected
    #[test]
    fn test_non_bearer_scheme_rejected() {
        let h = headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert_eq!(Credential::from_headers(&h), None);
    }

    // Test 5: Redacted preview never exposes the full value
    #[test]
    fn test_redacted_preview() {
        let cred = Credential::Bearer("tok_abcdefghij".to_string());
        assert_eq!(cred.redacted(), "tok_ab...");
        assert!(!cred.redacted().contains("abcdefghij"));

        let short = Credential::ApiKey("sk".to_string());
        assert_eq!(short.redacted(), "sk...");
    }

    // Test 6: Empty values yield no credential
    #[test]
    fn test_empty_values() {
        assert_eq!(Credential::from_headers(&HeaderMap::new()), None);
        let h = headers(&[("authorization", "Bearer ")]);
        assert_eq!(Credential::from_headers(&h), None);
        // Empty API key falls through to the Authorization header
        let h = headers(&[("x-api-key", ""), ("authorization", "Bearer tok")]);
        assert_eq!(
            Credential::from_headers(&h),
            Some(Credential::Bearer("tok".to_string()))
        );
    }
}
