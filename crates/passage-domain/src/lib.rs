//! Domain types shared across all Passage services.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; never in `infra/` or `handlers/`.

pub mod account;
pub mod chat;
pub mod password;
pub mod permission;
pub mod profile;
pub mod status;
