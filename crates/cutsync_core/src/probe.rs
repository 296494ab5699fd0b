//! Media probing seam.
//!
//! A [`MediaProber`] reports the frames available in a clip's media.
//! [`probe_timeline`] runs it over every untracked media reference so the
//! reconciler can give new Versions their frame range, or skip Versions for
//! media that cannot be read. Unreadable media is reported once, as a
//! `MediaUnavailable` warning of the reconciliation plan.

use thiserror::Error;

use crate::models::{FrameRange, MediaReference, Timeline, TimelineItem};
use crate::timecode::Timecode;

/// Properties of a media file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub frame_range: FrameRange,
    pub frame_rate: Option<f64>,
    /// Timecode of the first frame, if embedded.
    pub timecode: Option<Timecode>,
}

/// Probe failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    #[error("Media not found: {0}")]
    NotFound(String),

    #[error("Cannot read media '{target}': {message}")]
    Unreadable { target: String, message: String },
}

impl ProbeError {
    pub fn unreadable(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unreadable {
            target: target.into(),
            message: message.into(),
        }
    }
}

/// Counts from one [`probe_timeline`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeSummary {
    pub probed: usize,
    pub unavailable: usize,
}

/// Reads media properties.
pub trait MediaProber: Send + Sync {
    fn probe(&self, media: &MediaReference) -> Result<MediaInfo, ProbeError>;
}

/// Probe the untracked media of every clip.
///
/// Probed media gets its available range, and clips with no frame rate take
/// the media rate. Failed media is marked unavailable; the reconciler then
/// creates no Version for it and warns about it in the plan.
pub fn probe_timeline(timeline: &mut Timeline, prober: &dyn MediaProber) -> ProbeSummary {
    let mut summary = ProbeSummary::default();
    for item in &mut timeline.items {
        let TimelineItem::Clip(clip) = item else {
            continue;
        };
        let Some(media) = clip.media_reference.as_mut() else {
            continue;
        };
        if media.is_tracked() {
            continue;
        }
        summary.probed += 1;
        match prober.probe(media) {
            Ok(info) => {
                tracing::debug!(
                    "Probed '{}': frames {}-{}",
                    media.target,
                    info.frame_range.start,
                    info.frame_range.last()
                );
                media.available_range = Some(info.frame_range);
                media.unavailable_reason = None;
                if clip.frame_rate.is_none() {
                    clip.frame_rate = info.frame_rate;
                }
            }
            Err(err) => {
                tracing::debug!("Clip '{}' (#{}): {}", clip.name, clip.index, err);
                media.available_range = None;
                media.unavailable_reason = Some(err.to_string());
                summary.unavailable += 1;
            }
        }
    }
    summary
}
