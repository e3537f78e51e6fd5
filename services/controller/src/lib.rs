//! brood controller library.
//!
//! This crate primarily ships the `brood-controller` binary, but exposes its
//! pieces for integration testing and reuse:
//!
//! - [`reconciler::BirdReconciler`]: one reconciliation pass for one bird.
//! - [`factory::EggFactory`]: mints and persists a single egg.
//! - [`owner_index::OwnerIndexConfig`]: the index mapping birds to the eggs
//!   they control.
//! - [`controller::Controller`]: watches, work queue and worker pool.
//! - [`api`]: the HTTP surface.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod factory;
pub mod owner_index;
pub mod queue;
pub mod reconciler;
pub mod state;
