//! The child kind.

use serde::{Deserialize, Serialize};

use crate::meta::{ObjectMeta, Resource};

/// Label carrying the unique token an egg was minted with.
pub const EGG_TOKEN_LABEL: &str = "egg-token";

/// Desired state of an [`Egg`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EggSpec {
    /// Name of the bird that laid this egg. Denormalized from the owner
    /// reference.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent: String,
}

/// Observed state of an [`Egg`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EggStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Egg {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: EggSpec,
    #[serde(default)]
    pub status: EggStatus,
}

impl Egg {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            spec: EggSpec::default(),
            status: EggStatus::default(),
        }
    }
}

impl Resource for Egg {
    const KIND: &'static str = "Egg";
    const API_VERSION: &'static str = crate::GROUP_VERSION;

    type Status = EggStatus;

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn status(&self) -> &EggStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut EggStatus {
        &mut self.status
    }
}
