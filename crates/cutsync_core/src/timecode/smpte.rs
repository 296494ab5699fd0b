//! SMPTE-style timecode values and frame conversions.
//!
//! Timecodes are non drop-frame `HH:MM:SS:FF` values counted at the nominal
//! integer rate of a frame rate (23.976 counts at 24, 29.97 at 30).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors raised while parsing or converting timecodes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimecodeError {
    /// The text is not a `HH:MM:SS:FF` timecode.
    #[error("Malformed timecode '{0}'")]
    Malformed(String),

    /// The frame field does not fit the frame rate.
    #[error("Timecode '{timecode}' has frame {frames} out of range for {fps} fps")]
    FrameOutOfRange {
        timecode: String,
        frames: u32,
        fps: f64,
    },

    /// The frame rate cannot be used for counting frames.
    #[error("Invalid frame rate: {0}")]
    InvalidRate(f64),

    /// Timecodes cannot represent negative frame numbers.
    #[error("Cannot express negative frame {0} as a timecode")]
    NegativeFrame(i64),
}

/// Return the integer frame count per second used for timecode arithmetic.
///
/// # Examples
/// ```
/// use cutsync_core::timecode::nominal_fps;
///
/// assert_eq!(nominal_fps(23.976).unwrap(), 24);
/// assert_eq!(nominal_fps(25.0).unwrap(), 25);
/// ```
pub fn nominal_fps(fps: f64) -> Result<u32, TimecodeError> {
    if !fps.is_finite() || fps < 1.0 {
        return Err(TimecodeError::InvalidRate(fps));
    }
    Ok(fps.round() as u32)
}

/// A non drop-frame timecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timecode {
    hours: u32,
    minutes: u32,
    seconds: u32,
    frames: u32,
}

impl Timecode {
    /// Build a timecode from its fields.
    pub fn new(hours: u32, minutes: u32, seconds: u32, frames: u32) -> Self {
        Self {
            hours,
            minutes,
            seconds,
            frames,
        }
    }

    /// The `00:00:00:00` timecode.
    pub const fn zero() -> Self {
        Self {
            hours: 0,
            minutes: 0,
            seconds: 0,
            frames: 0,
        }
    }

    /// Parse a `HH:MM:SS:FF` string.
    pub fn parse(text: &str) -> Result<Self, TimecodeError> {
        let trimmed = text.trim();
        let parts: Vec<&str> = trimmed.split(':').collect();
        if parts.len() != 4 {
            return Err(TimecodeError::Malformed(text.to_string()));
        }

        let mut values = [0u32; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(TimecodeError::Malformed(text.to_string()));
            }
            *slot = part
                .parse()
                .map_err(|_| TimecodeError::Malformed(text.to_string()))?;
        }

        let [hours, minutes, seconds, frames] = values;
        if minutes > 59 || seconds > 59 {
            return Err(TimecodeError::Malformed(text.to_string()));
        }

        Ok(Self::new(hours, minutes, seconds, frames))
    }

    /// Build the timecode displayed at an absolute frame number.
    ///
    /// # Examples
    /// ```
    /// use cutsync_core::timecode::Timecode;
    ///
    /// let tc = Timecode::from_frames(86_411, 24.0).unwrap();
    /// assert_eq!(tc.to_string(), "01:00:00:11");
    /// ```
    pub fn from_frames(frame: i64, fps: f64) -> Result<Self, TimecodeError> {
        if frame < 0 {
            return Err(TimecodeError::NegativeFrame(frame));
        }
        let rate = i64::from(nominal_fps(fps)?);
        let frames = (frame % rate) as u32;
        let total_seconds = frame / rate;
        let seconds = (total_seconds % 60) as u32;
        let minutes = ((total_seconds / 60) % 60) as u32;
        let hours = (total_seconds / 3600) as u32;
        Ok(Self::new(hours, minutes, seconds, frames))
    }

    /// Convert to an absolute frame number.
    ///
    /// Fails if the frame field does not fit the rate.
    pub fn to_frames(&self, fps: f64) -> Result<i64, TimecodeError> {
        let rate = nominal_fps(fps)?;
        if self.frames >= rate {
            return Err(TimecodeError::FrameOutOfRange {
                timecode: self.to_string(),
                frames: self.frames,
                fps,
            });
        }
        let seconds =
            i64::from(self.hours) * 3600 + i64::from(self.minutes) * 60 + i64::from(self.seconds);
        Ok(seconds * i64::from(rate) + i64::from(self.frames))
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }
}

impl Default for Timecode {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )
    }
}

impl FromStr for Timecode {
    type Err = TimecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Serialized as text so persisted CutItems read like the tracking system's
// `timecode_*_text` fields.
impl Serialize for Timecode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Timecode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
