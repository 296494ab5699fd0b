//! In-memory editorial timeline: clips and gaps on a single track.

use serde::{Deserialize, Serialize};

use crate::timecode::{Timecode, TimecodeError};

use super::entities::EntityRef;

/// A span of frames, `start` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    /// First frame.
    pub start: i64,
    /// Number of frames.
    pub duration: i64,
}

impl FrameRange {
    pub fn new(start: i64, duration: i64) -> Self {
        Self { start, duration }
    }

    /// Frame right after the range.
    pub fn end_exclusive(&self) -> i64 {
        self.start + self.duration
    }

    /// Last frame inside the range.
    pub fn last(&self) -> i64 {
        self.start + self.duration - 1
    }
}

/// Media a clip points to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaReference {
    /// Path or URL of the media.
    pub target: String,
    /// Frames available in the media, filled by probing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_range: Option<FrameRange>,
    /// Tracked Version already published for this media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<EntityRef>,
    /// Why the media could not be probed, if it could not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
}

impl MediaReference {
    /// Create a reference to untracked media.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            available_range: None,
            version: None,
            unavailable_reason: None,
        }
    }

    /// Attach the tracked Version for this media.
    pub fn with_version(mut self, version: EntityRef) -> Self {
        self.version = Some(version);
        self
    }

    /// Set the probed frame range.
    pub fn with_available_range(mut self, range: FrameRange) -> Self {
        self.available_range = Some(range);
        self
    }

    /// Whether a Version is already tracked for this media.
    pub fn is_tracked(&self) -> bool {
        self.version.is_some()
    }

    /// Whether probing reported the media as missing.
    pub fn is_unavailable(&self) -> bool {
        self.unavailable_reason.is_some()
    }
}

/// Marker attached to a clip (EDL `LOC` lines end up here).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
}

impl Marker {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Explicit Shot information carried by a clip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipMetadata {
    /// Shot name recorded by the tracking system or the editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_name: Option<String>,
    /// Head in to use if the Shot is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_in: Option<i64>,
    /// Head handle length to use instead of the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_in_duration: Option<i64>,
    /// Tail handle length to use instead of the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail_out_duration: Option<i64>,
}

/// One editorial element with a Shot identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineClip {
    /// Clip (reel) name.
    pub name: String,
    /// 1-based position among clips, gaps excluded.
    pub index: usize,
    /// First source frame.
    pub source_in: i64,
    /// Source frame right after the last one used.
    pub source_out: i64,
    /// Clip frame rate; the timeline rate applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_reference: Option<MediaReference>,
    #[serde(default)]
    pub markers: Vec<Marker>,
    /// Free-form comments (EDL `*` lines).
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub metadata: ClipMetadata,
}

impl TimelineClip {
    /// Create a clip covering `source_in..source_out`.
    ///
    /// The index is assigned when the clip is pushed on a [`Timeline`].
    pub fn new(name: impl Into<String>, source_in: i64, source_out: i64) -> Self {
        Self {
            name: name.into(),
            index: 0,
            source_in,
            source_out,
            frame_rate: None,
            media_reference: None,
            markers: Vec::new(),
            comments: Vec::new(),
            metadata: ClipMetadata::default(),
        }
    }

    pub fn with_frame_rate(mut self, fps: f64) -> Self {
        self.frame_rate = Some(fps);
        self
    }

    pub fn with_media(mut self, media: MediaReference) -> Self {
        self.media_reference = Some(media);
        self
    }

    pub fn with_marker(mut self, name: impl Into<String>) -> Self {
        self.markers.push(Marker::new(name));
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }

    /// Set an explicit Shot name.
    pub fn with_shot_name(mut self, shot_name: impl Into<String>) -> Self {
        self.metadata.shot_name = Some(shot_name.into());
        self
    }

    pub fn with_metadata(mut self, metadata: ClipMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Number of source frames used.
    pub fn duration(&self) -> i64 {
        self.source_out - self.source_in
    }

    /// Source-in expressed as a timecode.
    pub fn source_in_timecode(&self, fps: f64) -> Result<Timecode, TimecodeError> {
        Timecode::from_frames(self.source_in, fps)
    }

    /// Source-out (exclusive) expressed as a timecode.
    pub fn source_out_timecode(&self, fps: f64) -> Result<Timecode, TimecodeError> {
        Timecode::from_frames(self.source_out, fps)
    }
}

/// Empty space on the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    pub duration: i64,
}

/// Element of a timeline track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TimelineItem {
    Clip(TimelineClip),
    Gap(Gap),
}

impl TimelineItem {
    /// Duration in frames, for edit position accounting.
    pub fn duration(&self) -> i64 {
        match self {
            TimelineItem::Clip(clip) => clip.duration(),
            TimelineItem::Gap(gap) => gap.duration,
        }
    }
}

/// A single-track editorial timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Timeline name, used as the Cut title.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
    /// Record timecode of the first frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timecode: Option<Timecode>,
    #[serde(default)]
    pub items: Vec<TimelineItem>,
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frame_rate: None,
            start_timecode: None,
            items: Vec::new(),
        }
    }

    pub fn with_frame_rate(mut self, fps: f64) -> Self {
        self.frame_rate = Some(fps);
        self
    }

    pub fn with_start_timecode(mut self, timecode: Timecode) -> Self {
        self.start_timecode = Some(timecode);
        self
    }

    /// Append a clip, assigning its 1-based clip index.
    pub fn push_clip(&mut self, mut clip: TimelineClip) -> &mut Self {
        clip.index = self.clip_count() + 1;
        self.items.push(TimelineItem::Clip(clip));
        self
    }

    /// Append a gap.
    pub fn push_gap(&mut self, duration: i64) -> &mut Self {
        self.items.push(TimelineItem::Gap(Gap { duration }));
        self
    }

    /// Builder form of [`Timeline::push_clip`].
    pub fn clip(mut self, clip: TimelineClip) -> Self {
        self.push_clip(clip);
        self
    }

    /// Builder form of [`Timeline::push_gap`].
    pub fn gap(mut self, duration: i64) -> Self {
        self.push_gap(duration);
        self
    }

    /// Clips in track order.
    pub fn clips(&self) -> impl Iterator<Item = &TimelineClip> {
        self.items.iter().filter_map(|item| match item {
            TimelineItem::Clip(clip) => Some(clip),
            TimelineItem::Gap(_) => None,
        })
    }

    pub fn clip_count(&self) -> usize {
        self.clips().count()
    }

    /// Total duration in frames, gaps included.
    pub fn duration(&self) -> i64 {
        self.items.iter().map(TimelineItem::duration).sum()
    }

    /// Frame rate of a clip, falling back to the timeline rate.
    pub fn clip_frame_rate(&self, clip: &TimelineClip) -> Option<f64> {
        clip.frame_rate.or(self.frame_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_indices_skip_gaps() {
        let timeline = Timeline::new("cut")
            .clip(TimelineClip::new("a", 0, 10))
            .gap(5)
            .clip(TimelineClip::new("b", 0, 10));

        let indices: Vec<usize> = timeline.clips().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(timeline.clip_count(), 2);
        assert_eq!(timeline.duration(), 25);
    }

    #[test]
    fn clip_rate_falls_back_to_timeline() {
        let timeline = Timeline::new("cut").with_frame_rate(24.0);
        let clip = TimelineClip::new("a", 0, 10);
        assert_eq!(timeline.clip_frame_rate(&clip), Some(24.0));

        let clip = clip.with_frame_rate(25.0);
        assert_eq!(timeline.clip_frame_rate(&clip), Some(25.0));
    }

    #[test]
    fn timeline_deserializes_tagged_items() {
        let json = r#"{
            "name": "reel_1",
            "frame_rate": 24.0,
            "items": [
                {"type": "clip", "name": "a", "index": 1, "source_in": 10, "source_out": 20},
                {"type": "gap", "duration": 4}
            ]
        }"#;
        let timeline: Timeline = serde_json::from_str(json).unwrap();
        assert_eq!(timeline.clip_count(), 1);
        assert_eq!(timeline.duration(), 14);
    }

    #[test]
    fn frame_range_bounds() {
        let range = FrameRange::new(1001, 10);
        assert_eq!(range.last(), 1010);
        assert_eq!(range.end_exclusive(), 1011);
    }
}
