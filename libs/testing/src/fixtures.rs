//! Object fixtures.

use std::time::Duration;

use brood_api::{set_controller_reference, Bird, Egg};
use brood_store::{Context, ResourceStore};

/// Namespace used by fixtures unless a test needs another.
pub const NAMESPACE: &str = "default";

/// Creates a bird and returns the stored copy.
pub async fn seed_bird(store: &dyn ResourceStore<Bird>, name: &str, eggs: Option<i32>) -> Bird {
    store
        .create(&Context::background(), Bird::new(NAMESPACE, name, eggs))
        .await
        .expect("seed bird")
}

/// Creates an egg controlled by `owner`, the way the controller would.
pub async fn seed_owned_egg(store: &dyn ResourceStore<Egg>, owner: &Bird, name: &str) -> Egg {
    let mut egg = Egg::new(&owner.metadata.namespace, name);
    egg.spec.parent = owner.metadata.name.clone();
    set_controller_reference(owner, &mut egg).expect("owner reference");
    store
        .create(&Context::background(), egg)
        .await
        .expect("seed owned egg")
}

/// Creates `names.len()` owned eggs with strictly increasing creation
/// timestamps, in the given order.
pub async fn seed_owned_eggs(store: &dyn ResourceStore<Egg>, owner: &Bird, names: &[&str]) -> Vec<Egg> {
    let mut eggs = Vec::with_capacity(names.len());
    for name in names {
        eggs.push(seed_owned_egg(store, owner, name).await);
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    eggs
}

/// Creates an egg with no owner reference.
pub async fn seed_unowned_egg(store: &dyn ResourceStore<Egg>, name: &str) -> Egg {
    store
        .create(&Context::background(), Egg::new(NAMESPACE, name))
        .await
        .expect("seed unowned egg")
}

/// Installs a test-friendly tracing subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
