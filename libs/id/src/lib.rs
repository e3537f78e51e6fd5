//! # brood-id
//!
//! Prefixed ULID identifiers, rendered `{prefix}_{ulid}`:
//!
//! - `uid_…` a stored object
//! - `egg_…` the token minted for each new egg
//! - `run_…` one reconciliation run, for log correlation
//! - `req_…` one HTTP request
//!
//! ULIDs carry 80 random bits, so tokens minted concurrently for the same
//! bird do not collide.

mod error;
mod macros;
mod prefixed;
mod types;

pub use error::IdError;
pub use prefixed::PrefixedId;
pub use types::*;

pub use ulid::Ulid;
