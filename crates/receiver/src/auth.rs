//! Caller identification.
//!
//! Verification itself lives outside the receiver; the server only needs
//! something that turns request headers into a [`Principal`] or refuses.

use std::collections::HashMap;
use std::fmt;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    pub name: String,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Identity verification failure. The message is returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct AuthError(pub String);

/// Verifies the credentials carried by an inbound request.
pub trait Identifier: Send + Sync + 'static {
    fn identify(&self, headers: &HeaderMap) -> Result<Principal, AuthError>;
}

/// Accepts every request as the same principal.
#[derive(Debug, Clone)]
pub struct AllowAll(pub Principal);

impl Identifier for AllowAll {
    fn identify(&self, _headers: &HeaderMap) -> Result<Principal, AuthError> {
        Ok(self.0.clone())
    }
}

/// Maps `Authorization: Bearer <token>` to a principal name.
#[derive(Clone, Default)]
pub struct TokenIdentifier {
    tokens: HashMap<String, String>,
}

impl TokenIdentifier {
    /// Builds an identifier from `(token, principal name)` pairs.
    pub fn new(tokens: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Debug for TokenIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the tokens themselves.
        f.debug_struct("TokenIdentifier")
            .field("principals", &self.tokens.len())
            .finish()
    }
}

impl Identifier for TokenIdentifier {
    fn identify(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let value = headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AuthError("missing Authorization header".into()))?;
        let value = value
            .to_str()
            .map_err(|_| AuthError("invalid Authorization header".into()))?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| AuthError("unsupported authorization scheme".into()))?
            .trim();

        // Compare against every entry so timing does not depend on which one matched.
        let mut found = None;
        for (known, name) in &self.tokens {
            if tokens_match(token, known) {
                found = Some(name);
            }
        }

        found
            .map(|name| Principal::new(name.clone()))
            .ok_or_else(|| AuthError("invalid token".into()))
    }
}

/// Constant-time token comparison.
fn tokens_match(received: &str, expected: &str) -> bool {
    if received.len() != expected.len() {
        return false;
    }
    let mut diff = 0u8;
    for (a, b) in received.bytes().zip(expected.bytes()) {
        diff |= a ^ b;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn identifier() -> TokenIdentifier {
        TokenIdentifier::new([
            ("s3cret".to_string(), "alice".to_string()),
            ("other-token".to_string(), "bob".to_string()),
        ])
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn known_token_maps_to_principal() {
        let principal = identifier()
            .identify(&headers_with("Bearer s3cret"))
            .unwrap();
        assert_eq!(principal, Principal::new("alice"));

        let principal = identifier()
            .identify(&headers_with("Bearer other-token"))
            .unwrap();
        assert_eq!(principal.name, "bob");
    }

    #[test]
    fn missing_header_is_rejected() {
        let err = identifier().identify(&HeaderMap::new()).unwrap_err();
        assert!(err.0.contains("missing"));
    }

    #[test]
    fn wrong_scheme_is_rejected() {
        let err = identifier()
            .identify(&headers_with("Basic czNjcmV0"))
            .unwrap_err();
        assert!(err.0.contains("scheme"));
    }

    #[test]
    fn unknown_token_is_rejected() {
        let err = identifier()
            .identify(&headers_with("Bearer s3cres"))
            .unwrap_err();
        assert_eq!(err, AuthError("invalid token".into()));
    }

    #[test]
    fn empty_table_rejects_everything() {
        let ident = TokenIdentifier::default();
        assert!(ident.is_empty());
        assert!(ident.identify(&headers_with("Bearer ")).is_err());
    }

    #[test]
    fn allow_all_ignores_headers() {
        let ident = AllowAll(Principal::new("dev"));
        assert_eq!(ident.identify(&HeaderMap::new()).unwrap().name, "dev");
    }

    #[test]
    fn debug_hides_tokens() {
        let dbg = format!("{:?}", identifier());
        assert!(!dbg.contains("s3cret"));
    }

    #[test]
    fn token_comparison() {
        assert!(tokens_match("abc", "abc"));
        assert!(!tokens_match("abc", "abd"));
        assert!(!tokens_match("abc", "abcd"));
    }
}
