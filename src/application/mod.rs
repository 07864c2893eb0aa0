//! Application services (use cases).
//!
//! [`GuardianEngine`] owns the lifecycle, [`Reconciler`] runs the passes and
//! [`SnapshotEmitter`] publishes their results.

mod emitter;
mod engine;
mod reconcile;
mod settings;

pub use emitter::{LogObserver, ObserverRegistry, SnapshotEmitter};
pub use engine::GuardianEngine;
pub use reconcile::{PassReport, PassTrigger, Reconciler};
pub use settings::GuardianSettings;
