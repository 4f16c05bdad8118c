//! # prr-id
//!
//! Identifier types for the pull request reviewer service.
//!
//! ## Design Principles
//!
//! - User, pull request and team identifiers are chosen by callers, so they
//!   are opaque strings; the types only guarantee they are well-formed
//! - Keys can only be built through `parse`, which validates
//! - Keys are typed to prevent passing a team name where a user id is expected
//!
//! ## Key Format
//!
//! A key is 1 to 255 bytes of UTF-8 without leading or trailing whitespace
//! and without control characters:
//! - `u1`, `alice`
//! - `pr-1001`
//! - `backend`
//!
//! Request ids are generated by the service and use `req_{ulid}`.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use macros::{validate_key, MAX_KEY_LEN};
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
