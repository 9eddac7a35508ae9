//! RS256 token signing and verification.

use std::fmt;
use std::str::FromStr;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
};
use serde::{Deserialize, Serialize};

use crate::jwks::{Jwk, JwkSet};

/// Token kind, carried in the JOSE `typ` header so a refresh token is never
/// accepted where an access token is expected (and vice versa).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenPurpose {
    Access,
    Refresh,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown token purpose: {0}")]
pub struct UnknownPurpose(pub String);

impl TokenPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenPurpose {
    type Err = UnknownPurpose;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(Self::Access),
            "refresh" => Ok(Self::Refresh),
            other => Err(UnknownPurpose(other.to_owned())),
        }
    }
}

/// Errors returned by [`KeyProvider::verify`].
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("token purpose mismatch")]
    WrongPurpose,
    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Errors raised while loading key material.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("invalid RSA private key: {0}")]
    InvalidPrivateKey(#[source] jsonwebtoken::errors::Error),
    #[error("invalid RSA public key: {0}")]
    InvalidPublicKey(String),
}

/// JWT claims payload.
///
/// | Field | JWT claim | Meaning |
/// |-------|-----------|---------|
/// | `iss` / `aud` | registered | issuer / audience |
/// | `sub` | registered | account id (UUID string) |
/// | `iat` / `exp` | registered | seconds since epoch |
/// | `jti` | registered | unique token id |
/// | `email` | custom | account email |
/// | `role` | custom | stored account role |
/// | `profile_id` | custom | active profile |
/// | `profile_ids` | custom | sibling profiles |
/// | `scope` | custom | resolved permissions |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
    pub email: String,
    pub role: String,
    pub profile_id: String,
    #[serde(default)]
    pub profile_ids: Vec<String>,
    #[serde(default)]
    pub scope: Vec<String>,
}

/// Holds the signing key pair and the published key-set document.
pub struct KeyProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    jwks: JwkSet,
    issuer: String,
    audience: String,
}

impl KeyProvider {
    /// Build from a PKCS#8 private key PEM and its SPKI public key PEM.
    pub fn from_rsa_pem(
        private_pem: &[u8],
        public_pem: &str,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self, KeyError> {
        let encoding = EncodingKey::from_rsa_pem(private_pem).map_err(KeyError::InvalidPrivateKey)?;
        let decoding = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        let jwk = Jwk::from_public_pem(public_pem)?;

        Ok(Self {
            encoding,
            decoding,
            jwks: JwkSet { keys: vec![jwk] },
            issuer: issuer.into(),
            audience: audience.into(),
        })
    }

    /// Key id of the key currently used for signing.
    pub fn kid(&self) -> &str {
        // Constructed with exactly one key.
        &self.jwks.keys[0].kid
    }

    pub fn jwks(&self) -> &JwkSet {
        &self.jwks
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Sign `claims` as a token of the given purpose.
    pub fn sign(&self, claims: &TokenClaims, purpose: TokenPurpose) -> Result<String, AuthError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.kid().to_owned());
        header.typ = Some(purpose.as_str().to_owned());
        encode(&header, claims, &self.encoding).map_err(AuthError::Signing)
    }

    /// Verify signature, key id, purpose, issuer, audience and expiry.
    ///
    /// Default leeway = 60s, tolerating clock skew between services.
    pub fn verify(&self, token: &str, purpose: TokenPurpose) -> Result<TokenClaims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::Malformed)?;

        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidSignature);
        }
        match header.kid.as_deref() {
            Some(kid) if self.jwks.find(kid).is_some() => {}
            _ => return Err(AuthError::InvalidSignature),
        }
        let presented = header
            .typ
            .as_deref()
            .and_then(|t| t.parse::<TokenPurpose>().ok());
        if presented != Some(purpose) {
            return Err(AuthError::WrongPurpose);
        }

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let data = decode::<TokenClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature
                | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm
                | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_) => AuthError::InvalidSignature,
                _ => AuthError::Malformed,
            }
        })?;

        Ok(data.claims)
    }
}
