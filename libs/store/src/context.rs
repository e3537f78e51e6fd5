//! Execution context for store operations.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{StoreError, StoreResult};

/// Deadline and cancellation signal carried into every store operation.
///
/// Contexts are cheap to clone. Deriving a context with a later deadline
/// than its parent keeps the parent's deadline.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Cancels every context derived from [`Context::cancellable`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl Context {
    /// A context with no deadline that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A fresh context plus the handle that cancels it.
    pub fn cancellable() -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (
            CancelHandle { tx },
            Self {
                deadline: None,
                cancel: Some(rx),
            },
        )
    }

    /// Derives a context cancelled when `signal` flips to `true`.
    ///
    /// This accepts the same shutdown receivers the workers are driven by.
    /// A previously attached signal is replaced.
    pub fn with_cancel(&self, signal: watch::Receiver<bool>) -> Self {
        Self {
            deadline: self.deadline,
            cancel: Some(signal),
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            cancel: self.cancel.clone(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The reason this context is done, if it is.
    pub fn err(&self) -> Option<StoreError> {
        if self.cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Some(StoreError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(StoreError::DeadlineExceeded);
        }
        None
    }

    /// Drives `operation` until it completes or the context is done,
    /// whichever happens first.
    pub async fn run<F, T>(&self, operation: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }

        tokio::select! {
            biased;
            _ = wait_cancelled(self.cancel.clone()) => Err(StoreError::Cancelled),
            _ = wait_deadline(self.deadline) => Err(StoreError::DeadlineExceeded),
            result = operation => result,
        }
    }
}

async fn wait_cancelled(signal: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = signal else {
        return std::future::pending().await;
    };
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        // A dropped sender can never cancel.
        if rx.changed().await.is_err() {
            return std::future::pending().await;
        }
    }
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_runs_to_completion() {
        let ctx = Context::background();
        let result = ctx.run(async { Ok::<_, StoreError>(7) }).await;
        assert_eq!(result, Ok(7));
        assert!(ctx.err().is_none());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (handle, ctx) = Context::cancellable();
        handle.cancel();

        let result = ctx.run(async { Ok::<_, StoreError>(()) }).await;
        assert_eq!(result, Err(StoreError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_operation() {
        let (handle, ctx) = Context::cancellable();

        let task = tokio::spawn(async move {
            ctx.run(async {
                std::future::pending::<()>().await;
                Ok::<_, StoreError>(())
            })
            .await
        });
        tokio::task::yield_now().await;
        handle.cancel();

        assert_eq!(task.await.unwrap(), Err(StoreError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_interrupts_pending_operation() {
        let ctx = Context::background().with_timeout(Duration::from_secs(5));

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, StoreError>(())
            })
            .await;

        assert_eq!(result, Err(StoreError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_deadline_never_extends_parent() {
        let parent = Context::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(30));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[tokio::test]
    async fn test_shutdown_signal_cancels() {
        let (tx, rx) = watch::channel(false);
        let ctx = Context::background().with_cancel(rx);
        assert!(ctx.err().is_none());

        tx.send(true).unwrap();
        assert_eq!(ctx.err(), Some(StoreError::Cancelled));
    }
}
