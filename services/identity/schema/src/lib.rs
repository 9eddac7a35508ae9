//! sea-orm entities owned by the identity service.
//!
//! Every table carries a `status` column (`active` | `deleted`); rows are never
//! hard-deleted and reads filter on `active`.

pub mod accounts;
pub mod member_chats;
pub mod profiles;
