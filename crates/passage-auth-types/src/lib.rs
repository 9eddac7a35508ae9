//! Key & Signature Provider shared by Passage services.
//!
//! Provides RS256 signing/verification, the published key-set document, and the
//! `BearerToken` extractor.

pub mod bearer;
pub mod jwks;
pub mod token;

pub use jwks::{Jwk, JwkSet};
pub use token::{AuthError, KeyError, KeyProvider, TokenClaims, TokenPurpose};
