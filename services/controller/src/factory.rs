//! Egg construction.

use std::sync::{Arc, Mutex};

use brood_api::{set_controller_reference, Bird, Egg, Resource, EGG_TOKEN_LABEL};
use brood_id::{EggToken, PrefixedId};
use brood_store::{create_or_update, Context, ResourceStore, MAX_NAME_LEN};
use tracing::{debug, instrument};

use crate::error::ReconcileError;

/// Lays new eggs for a bird.
pub struct EggFactory {
    eggs: Arc<dyn ResourceStore<Egg>>,
    tokens: Mutex<ulid::Generator>,
}

impl EggFactory {
    pub fn new(eggs: Arc<dyn ResourceStore<Egg>>) -> Self {
        Self {
            eggs,
            tokens: Mutex::new(ulid::Generator::new()),
        }
    }

    /// Persists one new egg controlled by `bird`.
    ///
    /// The egg is written with create-or-update semantics, then its
    /// `status.parent` is published with a status-only write. Earlier eggs
    /// are never touched, so a failure here leaves the store with fewer eggs
    /// than planned and the next run makes up the difference.
    #[instrument(skip(self, ctx, bird), fields(bird = %bird.metadata.name))]
    pub async fn create_egg(&self, ctx: &Context, bird: &Bird) -> Result<Egg, ReconcileError> {
        let token = self.next_token()?;
        let name = egg_name(&bird.metadata.name, &token);

        let mut template = Egg::new(&bird.metadata.namespace, &name);
        template
            .metadata
            .labels
            .insert(EGG_TOKEN_LABEL.to_string(), token.to_string());

        let (egg, result) = create_or_update(ctx, self.eggs.as_ref(), template, |egg| {
            if egg.spec.parent.is_empty() {
                egg.spec.parent = bird.metadata.name.clone();
            }
            set_controller_reference(bird, egg)?;
            Ok::<_, ReconcileError>(())
        })
        .await?;
        debug!(egg = %egg.metadata.name, ?result, "Persisted egg");

        let mut egg = egg;
        egg.status.parent = egg.spec.parent.clone();
        let egg = self.eggs.update_status(ctx, egg).await?;

        debug!(egg = %egg.key(), parent = %egg.status.parent, "Published egg status");
        Ok(egg)
    }

    fn next_token(&self) -> Result<EggToken, ReconcileError> {
        let mut tokens = self.tokens.lock().unwrap_or_else(|e| e.into_inner());
        tokens
            .generate()
            .map(EggToken::from_ulid)
            .map_err(|e| ReconcileError::TokenGeneration(e.to_string()))
    }
}

const EGG_NAME_PREFIX: &str = "egg-from-";

/// Length of [`EggToken::name_fragment`].
const TOKEN_FRAGMENT_LEN: usize = 26;

/// Longest parent name embedded verbatim in an egg name.
const MAX_PARENT_FRAGMENT_LEN: usize = MAX_NAME_LEN - EGG_NAME_PREFIX.len() - 1 - TOKEN_FRAGMENT_LEN;

/// Name of the egg minted for `parent` with `token`.
///
/// Long parent names are truncated so the result stays a valid object name;
/// the token keeps it unique and `spec.parent` keeps the full name.
pub fn egg_name(parent: &str, token: &EggToken) -> String {
    // Valid object names are ASCII, so any byte offset is a char boundary.
    let parent = parent.get(..MAX_PARENT_FRAGMENT_LEN).unwrap_or(parent);
    format!("{EGG_NAME_PREFIX}{parent}-{}", token.name_fragment())
}
