//! Timecode to frame mapping policies.
//!
//! Decides which absolute frame a new Shot's cut in lands on, given the
//! source-in timecode of its first clip.
//!
//! # Mapping Modes
//!
//! - **Absolute** (0): source timecode ignored, cut in is the Shot head in
//! - **Automatic** (1): cut in is the source timecode expressed in frames
//! - **Relative** (2): cut in is offset from an anchor `(timecode, frame)` pair

use serde::{Deserialize, Serialize};

use super::smpte::Timecode;
use crate::reconcile::ConfigurationError;

/// Policy mapping clip source timecodes to Shot frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimecodeMapping {
    /// Use the Shot's existing or default head in.
    #[default]
    Absolute,
    /// Convert the timecode straight to frames.
    Automatic,
    /// Offset the timecode from an anchor pair.
    Relative {
        /// Timecode that maps to `reference_frame`.
        reference_timecode: Timecode,
        /// Frame the anchor timecode maps to.
        reference_frame: i64,
    },
}

impl TimecodeMapping {
    /// Build a mapping from the numeric mode used in settings files.
    ///
    /// The anchor pair is only read for mode 2.
    pub fn from_mode(
        mode: u8,
        relative_mapping: Option<(&str, i64)>,
    ) -> Result<Self, ConfigurationError> {
        match mode {
            0 => Ok(Self::Absolute),
            1 => Ok(Self::Automatic),
            2 => {
                let (timecode, frame) = relative_mapping.ok_or_else(|| {
                    ConfigurationError::invalid_anchor("", 0, "Relative mapping requires an anchor")
                })?;
                let reference_timecode = Timecode::parse(timecode).map_err(|e| {
                    ConfigurationError::invalid_anchor(timecode, frame, e.to_string())
                })?;
                if frame < 0 {
                    return Err(ConfigurationError::invalid_anchor(
                        timecode,
                        frame,
                        "Anchor frame must not be negative",
                    ));
                }
                Ok(Self::Relative {
                    reference_timecode,
                    reference_frame: frame,
                })
            }
            other => Err(ConfigurationError::UnknownMappingMode(other)),
        }
    }

    /// Numeric mode as stored in settings.
    pub fn mode(&self) -> u8 {
        match self {
            Self::Absolute => 0,
            Self::Automatic => 1,
            Self::Relative { .. } => 2,
        }
    }

    /// Whether the mapping needs a frame rate to be evaluated.
    pub fn needs_frame_rate(&self) -> bool {
        !matches!(self, Self::Absolute)
    }

    /// Map a clip source-in timecode to the frame used as the Shot cut in.
    ///
    /// # Arguments
    /// * `clip` - Clip name, for error context
    /// * `source_in` - Source-in timecode of the clip
    /// * `fps` - Clip frame rate, if known
    /// * `head_in` - Shot's existing or default head in
    ///
    /// # Examples
    /// ```
    /// use cutsync_core::timecode::{Timecode, TimecodeMapping};
    ///
    /// let mapping = TimecodeMapping::from_mode(2, Some(("00:00:00:01", 1001))).unwrap();
    /// let tc = Timecode::parse("00:00:00:11").unwrap();
    /// assert_eq!(mapping.map("clip", &tc, Some(24.0), 1001).unwrap(), 1011);
    /// ```
    pub fn map(
        &self,
        clip: &str,
        source_in: &Timecode,
        fps: Option<f64>,
        head_in: i64,
    ) -> Result<i64, ConfigurationError> {
        match self {
            Self::Absolute => Ok(head_in),
            Self::Automatic => {
                let fps = fps.ok_or_else(|| ConfigurationError::unknown_frame_rate(clip))?;
                source_in
                    .to_frames(fps)
                    .map_err(|e| ConfigurationError::timecode(clip, e))
            }
            Self::Relative {
                reference_timecode,
                reference_frame,
            } => {
                let fps = fps.ok_or_else(|| ConfigurationError::unknown_frame_rate(clip))?;
                let reference = reference_timecode.to_frames(fps).map_err(|e| {
                    ConfigurationError::invalid_anchor(
                        reference_timecode.to_string(),
                        *reference_frame,
                        e.to_string(),
                    )
                })?;
                let frames = source_in
                    .to_frames(fps)
                    .map_err(|e| ConfigurationError::timecode(clip, e))?;
                Ok(reference_frame + (frames - reference))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tc(text: &str) -> Timecode {
        Timecode::parse(text).unwrap()
    }

    #[test]
    fn absolute_uses_head_in() {
        let mapping = TimecodeMapping::from_mode(0, None).unwrap();
        assert_eq!(mapping, TimecodeMapping::Absolute);
        // Frame rate is not needed.
        assert_eq!(mapping.map("A", &tc("01:00:00:00"), None, 1001).unwrap(), 1001);
    }

    #[test]
    fn automatic_converts_timecode() {
        let mapping = TimecodeMapping::from_mode(1, None).unwrap();
        assert_eq!(
            mapping.map("A", &tc("00:00:01:00"), Some(24.0), 1001).unwrap(),
            24
        );
    }

    #[test]
    fn relative_offsets_from_anchor() {
        let mapping = TimecodeMapping::from_mode(2, Some(("00:00:00:01", 1001))).unwrap();
        assert_eq!(
            mapping.map("A", &tc("00:00:00:11"), Some(24.0), 0).unwrap(),
            1011
        );
        // Timecodes before the anchor map below the anchor frame.
        assert_eq!(
            mapping.map("A", &tc("00:00:00:00"), Some(24.0), 0).unwrap(),
            1000
        );
    }

    #[test]
    fn relative_rejects_malformed_anchor() {
        let err = TimecodeMapping::from_mode(2, Some(("1:00", 1001))).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidAnchor { .. }));

        let err = TimecodeMapping::from_mode(2, None).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidAnchor { .. }));

        let err = TimecodeMapping::from_mode(2, Some(("00:00:00:00", -5))).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidAnchor { frame: -5, .. }));
    }

    #[test]
    fn unknown_frame_rate_is_a_configuration_error() {
        let mapping = TimecodeMapping::Automatic;
        let err = mapping.map("clip_1", &tc("00:00:00:11"), None, 0).unwrap_err();
        assert_eq!(err, ConfigurationError::unknown_frame_rate("clip_1"));
    }

    #[test]
    fn unknown_mode_rejected() {
        assert_eq!(
            TimecodeMapping::from_mode(3, None),
            Err(ConfigurationError::UnknownMappingMode(3))
        );
    }

    #[test]
    fn mode_round_trips() {
        for mode in 0..2 {
            assert_eq!(TimecodeMapping::from_mode(mode, None).unwrap().mode(), mode);
        }
        let relative = TimecodeMapping::from_mode(2, Some(("00:00:00:00", 0))).unwrap();
        assert_eq!(relative.mode(), 2);
        assert!(relative.needs_frame_rate());
    }
}
