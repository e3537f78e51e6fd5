//! Reconciliation primitives for fixed-cardinality ownership.
//!
//! A parent declares how many children it wants; the reconciler observes how
//! many it has and converges. This crate holds the pure parts of that loop:
//!
//! - [`CardinalityPlan`]: what a single pass must do given desired and
//!   observed counts.
//! - [`select_excess`]: deterministic choice of which children to remove.
//! - [`status_needs_update`]: whether the published count is stale.
//! - [`BackoffPolicy`]: retry delays for failed passes.
//!
//! # Invariants
//!
//! - Decisions are deterministic given the same inputs
//! - An absent or negative desired count means zero children
//! - A converged input always yields [`CardinalityPlan::Converged`]

use std::time::Duration;

use rand::Rng;

/// Convergence status of a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// Observed count matches desired count.
    Converged,

    /// Children still need to be created or deleted.
    Converging,
}

impl ConvergenceStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged)
    }
}

/// Action a single reconciliation pass must take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardinalityPlan {
    Converged,

    /// Create this many children.
    Create(usize),

    /// Delete this many children.
    Delete(usize),
}

impl CardinalityPlan {
    /// Plans a pass from the desired count (`None` when unset) and the number
    /// of children observed.
    pub fn compute(desired: Option<i32>, observed: usize) -> Self {
        let desired = desired_count(desired);
        match observed.cmp(&desired) {
            std::cmp::Ordering::Equal => Self::Converged,
            std::cmp::Ordering::Less => Self::Create(desired - observed),
            std::cmp::Ordering::Greater => Self::Delete(observed - desired),
        }
    }

    pub fn status(&self) -> ConvergenceStatus {
        match self {
            Self::Converged => ConvergenceStatus::Converged,
            Self::Create(_) | Self::Delete(_) => ConvergenceStatus::Converging,
        }
    }
}

/// Normalizes a desired count: unset and negative values mean zero.
pub fn desired_count(desired: Option<i32>) -> usize {
    desired
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0)
}

/// Returns true if a negative desired count was clamped to zero.
pub fn is_clamped(desired: Option<i32>) -> bool {
    desired.is_some_and(|n| n < 0)
}

/// Splits `children` into the `keep` lowest by `key` and the excess.
///
/// The sort is stable, so children with equal keys keep their input order.
pub fn select_excess<T, K, F>(mut children: Vec<T>, keep: usize, key: F) -> (Vec<T>, Vec<T>)
where
    K: Ord,
    F: FnMut(&T) -> K,
{
    children.sort_by_key(key);
    let excess = children.split_off(keep.min(children.len()));
    (children, excess)
}

/// Returns true if the recorded status count differs from the observed
/// count. An unset status counts as zero.
pub fn status_needs_update(recorded: Option<i32>, observed: usize) -> bool {
    let recorded = i64::from(recorded.unwrap_or(0));
    i64::try_from(observed).map_or(true, |observed| observed != recorded)
}

/// Retry delays for failed reconciliation passes.
///
/// Delays double per attempt starting at `base`, are capped at `max`, and
/// are spread by up to `jitter` (as a fraction) in either direction.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub base: Duration,

    /// Maximum delay.
    pub max: Duration,

    /// Jitter factor (0.0 to 1.0).
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_BACKOFF_BASE,
            max: DEFAULT_BACKOFF_MAX,
            jitter: 0.25,
        }
    }
}

impl BackoffPolicy {
    /// Delay for the given zero-based attempt number.
    pub fn delay(&self, attempt: u32) -> Duration {
        let max = self.max.as_millis() as f64;
        let delay = self.base.as_millis() as f64 * 2.0_f64.powi(attempt.min(63) as i32);
        let delay = delay.min(max);

        let jitter = self.jitter.clamp(0.0, 1.0);
        let factor = if jitter > 0.0 {
            rand::rng().random_range(1.0 - jitter..=1.0 + jitter)
        } else {
            1.0
        };

        Duration::from_millis((delay * factor).min(max) as u64)
    }
}

/// Default delay before the first retry.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(100);

/// Default retry delay cap.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(30);
