//! # brood-api
//!
//! Resource schema for the brood controller.
//!
//! Every stored object is a record with object metadata (namespace, name,
//! uid, resource version, creation timestamp, labels, owner references), a
//! desired-state `spec` and an observed-state `status`. Two kinds exist:
//!
//! - [`Bird`]: declares how many eggs it wants (`spec.eggNumbers`) and
//!   publishes how many it has (`status.eggNumbers`).
//! - [`Egg`]: a child owned by exactly one bird through a controller
//!   owner reference.
//!
//! Both kinds live in the `bird.my.domain/v1` group version.

mod bird;
mod egg;
mod error;
mod meta;
mod owner;

pub use bird::{Bird, BirdSpec, BirdStatus};
pub use egg::{Egg, EggSpec, EggStatus, EGG_TOKEN_LABEL};
pub use error::ApiError;
pub use meta::{ObjectKey, ObjectMeta, Resource};
pub use owner::{set_controller_reference, OwnerReference};

/// `group/version` of every brood kind, written into owner references.
pub const GROUP_VERSION: &str = "bird.my.domain/v1";
