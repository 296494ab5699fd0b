//! Reconciliation of an edited timeline against the tracked state of its Cut.
//!
//! The [`Reconciler`] computes a [`MutationPlan`](crate::models::MutationPlan)
//! without touching any store; persisting the plan is left to
//! [`crate::store::apply_plan`].

mod clock;
mod errors;
mod reconciler;

pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::{
    ClipError, ClipWarning, ConfigurationError, ReconcileError, ReconcileResult, TemplateError,
};
pub use reconciler::{reconcile, Reconciler};
