//! Per-Shot lifecycle: status transitions and frame values.

mod ranges;
mod status;

pub use ranges::{FrameDefaults, RangeCalculator, ShotRange};
pub use status::{StatusPolicy, Transition};
