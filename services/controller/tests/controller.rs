//! Controller loop end to end against in-memory stores.

use std::sync::Arc;
use std::time::Duration;

use brood_api::{Bird, Egg, ObjectKey};
use brood_controller::controller::{Controller, ControllerConfig};
use brood_controller::owner_index::OwnerIndexConfig;
use brood_reconcile::BackoffPolicy;
use brood_store::{Context, GarbageCollector, ListParams, MemoryStore, ResourceStore, StoreError};
use brood_testing::{init_tracing, Op, RecordingStore, NAMESPACE};
use tokio::sync::watch;
use tokio::task::JoinHandle;

const WAIT: Duration = Duration::from_secs(10);

struct Running {
    birds: Arc<MemoryStore<Bird>>,
    eggs: Arc<RecordingStore<Egg>>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Running {
    async fn start() -> Self {
        init_tracing();
        let birds = Arc::new(MemoryStore::<Bird>::new());
        let eggs = Arc::new(RecordingStore::<Egg>::new());
        let (shutdown, rx) = watch::channel(false);

        let controller = Controller::new(
            birds.clone(),
            eggs.clone(),
            OwnerIndexConfig::default(),
            ControllerConfig {
                workers: 2,
                reconcile_timeout: Duration::from_secs(5),
                resync_interval: Duration::from_secs(60),
                backoff: BackoffPolicy {
                    base: Duration::from_millis(5),
                    max: Duration::from_millis(50),
                    jitter: 0.0,
                },
            },
        );
        let gc = GarbageCollector::<Bird, Egg>::new(birds.clone(), eggs.clone());

        let tasks = vec![
            tokio::spawn({
                let rx = rx.clone();
                async move { controller.run(rx).await.unwrap() }
            }),
            tokio::spawn(async move { gc.run(rx).await }),
        ];

        Self {
            birds,
            eggs,
            shutdown,
            tasks,
        }
    }

    async fn apply(&self, name: &str, eggs: Option<i32>) {
        let ctx = Context::background();
        let key = ObjectKey::new(NAMESPACE, name);
        match self.birds.get(&ctx, &key).await {
            Ok(mut bird) => {
                // Unconditional write; the controller may have bumped the version.
                bird.metadata.resource_version = 0;
                bird.spec.egg_numbers = eggs;
                self.birds.update(&ctx, bird).await.unwrap();
            }
            Err(_) => {
                self.birds
                    .create(&ctx, Bird::new(NAMESPACE, name, eggs))
                    .await
                    .unwrap();
            }
        }
    }

    async fn eggs_of(&self, name: &str) -> Vec<Egg> {
        let params = OwnerIndexConfig::default().list_params(&ObjectKey::new(NAMESPACE, name));
        self.eggs
            .inner()
            .list(&Context::background(), &params)
            .await
            .unwrap_or_default()
    }

    async fn status_of(&self, name: &str) -> Option<i32> {
        self.birds
            .get(&Context::background(), &ObjectKey::new(NAMESPACE, name))
            .await
            .ok()
            .and_then(|b| b.status.egg_numbers)
    }

    /// Polls the eggs of `name` until `check` accepts them.
    async fn wait_for_eggs(&self, name: &str, what: &str, check: impl Fn(&[Egg]) -> bool) {
        let deadline = tokio::time::Instant::now() + WAIT;
        while tokio::time::Instant::now() < deadline {
            if check(&self.eggs_of(name).await) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {what}");
    }

    async fn wait_for_count(&self, name: &str, count: usize) {
        self.wait_for_eggs(name, &format!("{count} eggs of {name}"), |eggs| eggs.len() == count)
            .await;
    }

    async fn wait_for_status(&self, name: &str, expected: Option<i32>) {
        let deadline = tokio::time::Instant::now() + WAIT;
        while tokio::time::Instant::now() < deadline {
            if self.status_of(name).await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for status {expected:?} on {name}");
    }

    async fn stop(self) {
        self.shutdown.send(true).unwrap();
        for task in self.tasks {
            tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn follows_spec_changes() {
    let env = Running::start().await;

    env.apply("robin", Some(3)).await;
    env.wait_for_count("robin", 3).await;
    env.wait_for_status("robin", Some(3)).await;

    env.apply("robin", Some(1)).await;
    env.wait_for_count("robin", 1).await;
    env.wait_for_status("robin", Some(1)).await;

    env.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn replaces_externally_deleted_egg() {
    let env = Running::start().await;

    env.apply("robin", Some(2)).await;
    env.wait_for_count("robin", 2).await;

    let victim = env.eggs_of("robin").await.remove(0);
    env.eggs
        .inner()
        .delete(&Context::background(), &victim.metadata.key())
        .await
        .unwrap();

    env.wait_for_eggs("robin", "replacement egg", |eggs| {
        eggs.len() == 2 && eggs.iter().all(|e| e.metadata.name != victim.metadata.name)
    })
    .await;

    env.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn deleting_bird_collects_its_eggs() {
    let env = Running::start().await;

    env.apply("robin", Some(2)).await;
    env.apply("wren", Some(1)).await;
    env.wait_for_count("robin", 2).await;
    env.wait_for_count("wren", 1).await;

    env.birds
        .delete(&Context::background(), &ObjectKey::new(NAMESPACE, "robin"))
        .await
        .unwrap();

    env.wait_for_count("robin", 0).await;
    assert_eq!(env.eggs_of("wren").await.len(), 1);

    env.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn retries_after_transient_failure() {
    let env = Running::start().await;
    env.eggs
        .fail_nth(Op::Create, 1, StoreError::Unavailable("injected".into()));

    env.apply("robin", Some(2)).await;

    env.wait_for_count("robin", 2).await;
    assert!(env.eggs.counts().get(Op::Create) >= 3);

    let all = env
        .eggs
        .inner()
        .list(&Context::background(), &ListParams::all())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    env.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn permanent_failure_waits_for_next_change() {
    let env = Running::start().await;
    env.eggs.fail_always(
        Op::Create,
        StoreError::Invalid {
            kind: "Egg",
            message: "injected".into(),
        },
    );

    env.apply("robin", Some(1)).await;

    let deadline = tokio::time::Instant::now() + WAIT;
    while env.eggs.counts().get(Op::Create) == 0 {
        assert!(tokio::time::Instant::now() < deadline, "no create attempted");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    // Backoff tops out at 50ms, so retrying would have made many more attempts.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(env.eggs.counts().get(Op::Create) <= 2);
    assert!(env.eggs_of("robin").await.is_empty());

    // A spec change enqueues the bird again.
    env.eggs.clear_faults();
    env.apply("robin", Some(2)).await;
    env.wait_for_count("robin", 2).await;
    env.wait_for_status("robin", Some(2)).await;

    env.stop().await;
}
