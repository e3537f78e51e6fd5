//! Owner index: finds the eggs a bird controls.

use std::sync::Arc;

use brood_api::{Bird, Egg, ObjectKey, Resource};
use brood_store::{IndexFn, ListParams, ResourceStore, StoreResult};

/// Identity of the owner index and of the owner type it recognizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerIndexConfig {
    /// Name the index is registered under.
    pub index_name: String,

    /// `group/version` an owner reference must carry.
    pub owner_api_version: String,

    /// Kind an owner reference must carry.
    pub owner_kind: String,
}

impl Default for OwnerIndexConfig {
    fn default() -> Self {
        Self {
            index_name: ".metadata.controller".to_string(),
            owner_api_version: Bird::API_VERSION.to_string(),
            owner_kind: Bird::KIND.to_string(),
        }
    }
}

impl OwnerIndexConfig {
    /// Index keys for an egg: the controlling owner's name when the
    /// controller reference points at the configured owner type, otherwise
    /// none.
    pub fn keys(&self, egg: &Egg) -> Vec<String> {
        self.owner_of(egg).into_iter().collect()
    }

    /// Name of the configured-type owner controlling `egg`, if any.
    pub fn owner_of(&self, egg: &Egg) -> Option<String> {
        egg.metadata
            .controller_ref()
            .filter(|r| r.refers_to(&self.owner_api_version, &self.owner_kind))
            .map(|r| r.name.clone())
    }

    /// Key of the bird controlling `egg`, if any.
    pub fn owner_key(&self, egg: &Egg) -> Option<ObjectKey> {
        self.owner_of(egg)
            .map(|name| ObjectKey::new(&egg.metadata.namespace, name))
    }

    pub fn index_fn(&self) -> IndexFn<Egg> {
        let config = self.clone();
        Arc::new(move |egg: &Egg| config.keys(egg))
    }

    /// Registers the index on `store`. Call once at startup.
    pub async fn register(&self, store: &dyn ResourceStore<Egg>) -> StoreResult<()> {
        store.register_index(&self.index_name, self.index_fn()).await
    }

    /// List parameters selecting the eggs controlled by `owner`.
    pub fn list_params(&self, owner: &ObjectKey) -> ListParams {
        ListParams::in_namespace(&owner.namespace).matching(&self.index_name, &owner.name)
    }
}
