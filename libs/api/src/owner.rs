//! Owner references: the structural back-reference from a child to its owner.

use brood_id::ObjectUid;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::meta::Resource;

/// Reference from a dependent object to the object that owns it.
///
/// The store garbage-collects dependents whose owner is deleted. At most one
/// reference on an object may be flagged as controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: ObjectUid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_owner_deletion: Option<bool>,
}

impl OwnerReference {
    pub fn is_controller(&self) -> bool {
        self.controller == Some(true)
    }

    /// True if this reference points at the given type, matching group,
    /// version and kind exactly.
    pub fn refers_to(&self, api_version: &str, kind: &str) -> bool {
        self.api_version == api_version && self.kind == kind
    }

    fn group(&self) -> &str {
        self.api_version
            .split_once('/')
            .map(|(group, _)| group)
            .unwrap_or("")
    }
}

/// Marks `owner` as the managing controller of `object`.
///
/// An existing reference to the same owner (same group, kind and name) is
/// replaced in place; otherwise a new controller reference is appended.
/// Fails if the owner has not been persisted yet, lives in another namespace,
/// or if a different object already controls `object`.
pub fn set_controller_reference<O, R>(owner: &O, object: &mut R) -> Result<(), ApiError>
where
    O: Resource,
    R: Resource,
{
    let owner_meta = owner.meta();
    let uid = owner_meta.uid.ok_or_else(|| ApiError::OwnerWithoutUid {
        kind: O::KIND,
        name: owner_meta.name.clone(),
    })?;

    if owner_meta.namespace != object.meta().namespace {
        return Err(ApiError::CrossNamespaceOwner {
            owner_namespace: owner_meta.namespace.clone(),
            object_namespace: object.meta().namespace.clone(),
        });
    }

    let reference = OwnerReference {
        api_version: O::API_VERSION.to_string(),
        kind: O::KIND.to_string(),
        name: owner_meta.name.clone(),
        uid,
        controller: Some(true),
        block_owner_deletion: Some(true),
    };

    if let Some(existing) = object.meta().controller_ref() {
        if !same_owner(existing, &reference) {
            return Err(ApiError::AlreadyOwned {
                object: object.meta().name.clone(),
                kind: existing.kind.clone(),
                name: existing.name.clone(),
            });
        }
    }

    let references = &mut object.meta_mut().owner_references;
    match references.iter_mut().find(|r| same_owner(r, &reference)) {
        Some(existing) => *existing = reference,
        None => references.push(reference),
    }

    Ok(())
}

/// Owner identity compares group (not version), kind and name.
fn same_owner(a: &OwnerReference, b: &OwnerReference) -> bool {
    a.group() == b.group() && a.kind == b.kind && a.name == b.name
}
