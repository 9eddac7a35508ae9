use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;
use url::Url;

use passage_core::config::Config;

use crate::domain::types::TokenSettings;

/// Identity service configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis connection URL (credential store, broker streams, expiry notifications).
    pub redis_url: String,
    /// PKCS#8 PEM used to sign tokens.
    pub jwt_private_key_path: String,
    /// SPKI PEM published through the key-set document.
    pub jwt_public_key_path: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    /// Access token lifetime in minutes. Env var: `JWT_ACCESS_EXPIRED`.
    #[serde(default = "default_access_expired")]
    pub jwt_access_expired: u64,
    /// Refresh token lifetime in days. Env var: `JWT_REFRESH_EXPIRED`.
    #[serde(default = "default_refresh_expired")]
    pub jwt_refresh_expired: u64,
    /// TCP port to listen on (default 3000). Env var: `IDENTITY_PORT`.
    #[serde(default = "default_port")]
    pub identity_port: u16,
    #[serde(default = "default_consumer_group")]
    pub consumer_group: String,
    #[serde(default = "default_consumer_name")]
    pub consumer_name: String,
    /// How long a created profile waits for downstream confirmation.
    #[serde(default = "default_pending_ttl")]
    pub pending_profile_ttl_secs: u64,
    #[serde(default = "default_forgot_ttl")]
    pub forgot_code_ttl_secs: u64,
}

impl Config for IdentityConfig {}

impl IdentityConfig {
    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            access_ttl: Duration::from_secs(self.jwt_access_expired * 60),
            refresh_ttl: Duration::from_secs(self.jwt_refresh_expired * 24 * 60 * 60),
        }
    }

    /// Logical database `redis_url` selects, as the pool connects to it. The expiry
    /// listener subscribes to that database's `__keyevent@<db>__:expired` channel.
    pub fn redis_db(&self) -> anyhow::Result<u8> {
        let url = Url::parse(&self.redis_url).context("parse REDIS_URL")?;
        let db = match url.scheme() {
            "unix" | "redis+unix" => url
                .query_pairs()
                .find(|(name, _)| name == "db")
                .map(|(_, value)| value.into_owned()),
            _ => Some(url.path().trim_matches('/').to_owned()).filter(|path| !path.is_empty()),
        };
        match db {
            Some(db) => db
                .parse()
                .with_context(|| format!("REDIS_URL selects invalid database {db:?}")),
            None => Ok(0),
        }
    }

    pub fn pending_profile_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_profile_ttl_secs)
    }

    pub fn forgot_code_ttl(&self) -> Duration {
        Duration::from_secs(self.forgot_code_ttl_secs)
    }
}

fn default_access_expired() -> u64 {
    15
}

fn default_refresh_expired() -> u64 {
    30
}

fn default_port() -> u16 {
    3000
}

fn default_consumer_group() -> String {
    "auth_consumer".to_owned()
}

fn default_consumer_name() -> String {
    "identity-1".to_owned()
}

fn default_pending_ttl() -> u64 {
    900
}

fn default_forgot_ttl() -> u64 {
    900
}
