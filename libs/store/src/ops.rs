//! Helpers layered on top of [`ResourceStore`].

use brood_api::Resource;
use tracing::debug;

use crate::context::Context;
use crate::error::{StoreError, StoreResult};
use crate::store::ResourceStore;

/// What [`create_or_update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    Created,
    Updated,
    Unchanged,
}

/// Fetches the object at `object`'s key and applies `mutate` to it, then
/// creates or updates it as needed.
///
/// When the object does not exist, `mutate` runs against `object` itself and
/// the result is created. When it exists, `mutate` runs against the stored
/// copy and an update is issued only if something changed. `mutate` must not
/// change the object's namespace or name.
pub async fn create_or_update<R, S, F, E>(
    ctx: &Context,
    store: &S,
    object: R,
    mut mutate: F,
) -> Result<(R, OperationResult), E>
where
    R: Resource,
    S: ResourceStore<R> + ?Sized,
    F: FnMut(&mut R) -> Result<(), E> + Send,
    E: From<StoreError>,
{
    let key = object.key();

    let Some(existing) = store.get(ctx, &key).await.ignore_not_found()? else {
        let mut object = object;
        mutate(&mut object)?;
        ensure_key_unchanged(&object, &key)?;

        let created = store.create(ctx, object).await?;
        debug!(kind = R::KIND, key = %key, "create_or_update created object");
        return Ok((created, OperationResult::Created));
    };

    let mut desired = existing.clone();
    mutate(&mut desired)?;
    ensure_key_unchanged(&desired, &key)?;

    if desired == existing {
        return Ok((existing, OperationResult::Unchanged));
    }

    let updated = store.update(ctx, desired).await?;
    debug!(kind = R::KIND, key = %key, "create_or_update updated object");
    Ok((updated, OperationResult::Updated))
}

fn ensure_key_unchanged<R: Resource>(object: &R, key: &brood_api::ObjectKey) -> StoreResult<()> {
    if object.key() != *key {
        return Err(StoreError::Invalid {
            kind: R::KIND,
            message: format!("mutation changed object key from '{key}' to '{}'", object.key()),
        });
    }
    Ok(())
}

/// Conversions for store results.
pub trait StoreResultExt<T> {
    /// Maps `NotFound` to `Ok(None)`.
    fn ignore_not_found(self) -> StoreResult<Option<T>>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn ignore_not_found(self) -> StoreResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}
