//! Authorization header helpers for integration tests.

use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};

/// Headers carrying `Authorization: Bearer <token>`.
pub fn bearer_headers(token: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("token is header-safe"),
    );
    map
}
