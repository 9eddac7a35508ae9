pub mod auth;
pub mod group;
pub mod health;
pub mod jwks;
