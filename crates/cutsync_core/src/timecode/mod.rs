//! Timecode values and timecode to frame mapping.
//!
//! All functions are pure; frame rates are plain `f64` frames per second and
//! timecodes count at the nominal integer rate.

mod mapper;
mod smpte;

pub use mapper::TimecodeMapping;
pub use smpte::{nominal_fps, Timecode, TimecodeError};
