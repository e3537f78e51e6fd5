//! Object identity and metadata shared by every kind.

use std::collections::BTreeMap;
use std::fmt;

use brood_id::ObjectUid;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::owner::OwnerReference;

/// Namespace-scoped identity of a stored object.
///
/// Ordering is by namespace, then name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Metadata carried by every object.
///
/// `uid`, `resource_version` and `creation_timestamp` are assigned by the
/// store; callers leave them unset on create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,

    pub namespace: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<ObjectUid>,

    /// Zero means "unset": writes carrying zero skip the optimistic
    /// concurrency check.
    #[serde(default)]
    pub resource_version: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,
}

impl ObjectMeta {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(&self.namespace, &self.name)
    }

    /// The owner reference flagged as controller, if any.
    pub fn controller_ref(&self) -> Option<&OwnerReference> {
        self.owner_references.iter().find(|r| r.is_controller())
    }
}

/// A typed resource the store can hold.
///
/// The store reads and writes across exactly this boundary: metadata, a
/// desired-state spec embedded in the object, and a separately writable
/// status.
pub trait Resource:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Kind name, e.g. `Bird`.
    const KIND: &'static str;

    /// `group/version` of the kind.
    const API_VERSION: &'static str;

    /// Observed-state sub-record, written only through status updates.
    type Status: Clone + fmt::Debug + Default + PartialEq + Send + Sync;

    fn meta(&self) -> &ObjectMeta;

    fn meta_mut(&mut self) -> &mut ObjectMeta;

    fn status(&self) -> &Self::Status;

    fn status_mut(&mut self) -> &mut Self::Status;

    fn key(&self) -> ObjectKey {
        self.meta().key()
    }
}
