//! The parent kind.

use serde::{Deserialize, Serialize};

use crate::meta::{ObjectMeta, Resource};

/// Desired state of a [`Bird`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirdSpec {
    /// Number of eggs the bird wants. Unset means no managed eggs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egg_numbers: Option<i32>,
}

/// Observed state of a [`Bird`], written only by the reconciler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirdStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egg_numbers: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bird {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: BirdSpec,
    #[serde(default)]
    pub status: BirdStatus,
}

impl Bird {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, egg_numbers: Option<i32>) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            spec: BirdSpec { egg_numbers },
            status: BirdStatus::default(),
        }
    }
}

impl Resource for Bird {
    const KIND: &'static str = "Bird";
    const API_VERSION: &'static str = crate::GROUP_VERSION;

    type Status = BirdStatus;

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn status(&self) -> &BirdStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut BirdStatus {
        &mut self.status
    }
}
