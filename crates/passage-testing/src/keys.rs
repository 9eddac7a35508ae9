//! Fixed 2048-bit RSA key pairs for tests.
//!
//! The `OTHER_*` pair is never published by [`test_key_provider`]; tokens it signs
//! must fail verification.

use passage_auth_types::KeyProvider;

pub const TEST_PRIVATE_KEY_PEM: &str = include_str!("../keys/test_private.pem");
pub const TEST_PUBLIC_KEY_PEM: &str = include_str!("../keys/test_public.pem");
pub const OTHER_PRIVATE_KEY_PEM: &str = include_str!("../keys/other_private.pem");
pub const OTHER_PUBLIC_KEY_PEM: &str = include_str!("../keys/other_public.pem");

pub const TEST_ISSUER: &str = "passage-test";
pub const TEST_AUDIENCE: &str = "passage-test-api";

/// Provider backed by the fixed test key pair.
pub fn test_key_provider() -> KeyProvider {
    KeyProvider::from_rsa_pem(
        TEST_PRIVATE_KEY_PEM.as_bytes(),
        TEST_PUBLIC_KEY_PEM,
        TEST_ISSUER,
        TEST_AUDIENCE,
    )
    .expect("embedded test key pair is valid")
}

/// Provider with the same issuer/audience but an unpublished key.
pub fn other_key_provider() -> KeyProvider {
    KeyProvider::from_rsa_pem(
        OTHER_PRIVATE_KEY_PEM.as_bytes(),
        OTHER_PUBLIC_KEY_PEM,
        TEST_ISSUER,
        TEST_AUDIENCE,
    )
    .expect("embedded test key pair is valid")
}
