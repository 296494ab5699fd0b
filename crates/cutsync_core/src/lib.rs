//! Cut Sync Core - reconciles editorial timelines with tracked Cuts
//!
//! Given a timeline and the previous state of its Cut, the engine works out
//! which Shots to create, update, omit or reinstate, which Versions to
//! publish and the new Cut revision with its items. Persistence goes through
//! the [`store::EntityStore`] abstraction.

pub mod config;
pub mod diff;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod naming;
pub mod probe;
pub mod reconcile;
pub mod store;
pub mod timecode;

pub use config::Settings;
pub use models::{CutSnapshot, CutTarget, MutationPlan, Timeline};
pub use reconcile::{reconcile, ReconcileError, ReconcileResult, Reconciler};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
