//! Frame values of a Shot: head in, cut in and out, handle lengths.

use crate::config::CutSettings;
use crate::diff::ResolvedClip;
use crate::models::{CutItem, Shot};
use crate::reconcile::ConfigurationError;
use crate::timecode::TimecodeMapping;

/// Frame values applied when a Shot has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDefaults {
    pub head_in: i64,
    pub head_in_duration: i64,
    pub tail_out_duration: i64,
}

impl FrameDefaults {
    pub fn from_settings(settings: &CutSettings) -> Self {
        Self {
            head_in: settings.default_head_in,
            head_in_duration: settings.default_head_in_duration,
            tail_out_duration: settings.default_tail_out_duration,
        }
    }
}

impl Default for FrameDefaults {
    fn default() -> Self {
        Self::from_settings(&CutSettings::default())
    }
}

/// Computed frame values of one Shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotRange {
    pub head_in: i64,
    pub head_in_duration: i64,
    pub tail_out_duration: i64,
    pub cut_in: i64,
    pub cut_out: i64,
    /// Smallest clip index among the Shot's clips.
    pub cut_order: usize,
    /// Earliest source frame used by the Shot's clips.
    pub min_source_in: i64,
    /// Why the new range does not fit the media covered by the handles.
    pub rescan_reasons: Vec<String>,
}

impl ShotRange {
    pub fn needs_rescan(&self) -> bool {
        !self.rescan_reasons.is_empty()
    }

    /// Shot-relative first frame of a clip of this Shot.
    pub fn cut_item_in(&self, source_in: i64) -> i64 {
        self.cut_in + (source_in - self.min_source_in)
    }

    /// Write the values on a Shot.
    pub fn apply(&self, shot: &mut Shot) {
        shot.head_in = Some(self.head_in);
        shot.head_in_duration = Some(self.head_in_duration);
        shot.tail_out_duration = Some(self.tail_out_duration);
        shot.cut_in = Some(self.cut_in);
        shot.cut_out = Some(self.cut_out);
        shot.cut_order = Some(self.cut_order);
    }
}

/// Computes Shot frame values for a pass.
#[derive(Debug, Clone)]
pub struct RangeCalculator {
    defaults: FrameDefaults,
    mapping: TimecodeMapping,
}

impl RangeCalculator {
    pub fn new(defaults: FrameDefaults, mapping: TimecodeMapping) -> Self {
        Self { defaults, mapping }
    }

    pub fn mapping(&self) -> &TimecodeMapping {
        &self.mapping
    }

    /// Frame values of a Shot used by `clips`.
    ///
    /// `existing` is the tracked Shot, if any, and `previous_items` its items
    /// in the previous Cut. An existing Shot's range continues from its
    /// previous items; the timecode mapping only places Shots with no
    /// recorded cut in.
    ///
    /// The head handle always ends right before cut in, so
    /// `head_in + head_in_duration == cut_in`. A recorded head in never
    /// moves. Otherwise the requested head in is moved earlier when cut in
    /// leaves less than the head duration before it.
    pub fn compute(
        &self,
        existing: Option<&Shot>,
        previous_items: &[&CutItem],
        clips: &[&ResolvedClip<'_>],
    ) -> Result<ShotRange, ConfigurationError> {
        let first = clips
            .iter()
            .min_by_key(|resolved| (resolved.clip.source_in, resolved.clip.index))
            .ok_or_else(|| {
                ConfigurationError::invalid_setting("clips", "a Shot range needs at least one clip")
            })?;
        let min_source_in = first.clip.source_in;
        let max_source_out = clips
            .iter()
            .map(|resolved| resolved.clip.source_out)
            .max()
            .unwrap_or(first.clip.source_out);
        let cut_order = clips
            .iter()
            .map(|resolved| resolved.clip.index)
            .min()
            .unwrap_or(first.clip.index);

        let overrides = &first.clip.metadata;
        let recorded_head_in = existing.and_then(|shot| shot.head_in);
        let requested_head_in = recorded_head_in
            .or(overrides.head_in)
            .unwrap_or(self.defaults.head_in);

        let cut_in = match previous_items.iter().min_by_key(|item| item.cut_item_in) {
            Some(anchor) => {
                let anchor_source = anchor
                    .timecode_cut_item_in
                    .to_frames(first.fps)
                    .map_err(|e| ConfigurationError::timecode(&first.clip.name, e))?;
                anchor.cut_item_in + (min_source_in - anchor_source)
            }
            None => match existing.and_then(|shot| shot.cut_in) {
                Some(cut_in) => cut_in,
                None => {
                    let source_in = first
                        .clip
                        .source_in_timecode(first.fps)
                        .map_err(|e| ConfigurationError::timecode(&first.clip.name, e))?;
                    self.mapping
                        .map(&first.clip.name, &source_in, Some(first.fps), requested_head_in)?
                }
            },
        };
        let cut_out = cut_in + (max_source_out - min_source_in) - 1;

        let base_head = existing
            .and_then(|shot| shot.head_in_duration)
            .or(overrides.head_in_duration)
            .unwrap_or(self.defaults.head_in_duration);
        let head_in = match recorded_head_in {
            Some(head_in) => head_in,
            None => requested_head_in.min(cut_in - base_head),
        };
        let head_in_duration = cut_in - head_in;

        let base_tail = existing
            .and_then(|shot| shot.tail_out_duration)
            .or(overrides.tail_out_duration)
            .unwrap_or(self.defaults.tail_out_duration);
        let previous_tail_out = existing.and_then(Shot::tail_out);
        let tail_out_duration = match previous_tail_out {
            Some(tail_out) => base_tail.max(tail_out - cut_out),
            None => base_tail,
        };

        let mut rescan_reasons = Vec::new();
        if head_in_duration < 0 {
            rescan_reasons.push(format!(
                "Cut in {} is before head in {}",
                cut_in, head_in
            ));
        }
        if let Some(tail_out) = previous_tail_out {
            if cut_out > tail_out {
                rescan_reasons.push(format!(
                    "Cut out {} is after tail out {}",
                    cut_out, tail_out
                ));
            }
        }

        Ok(ShotRange {
            head_in,
            head_in_duration,
            tail_out_duration,
            cut_in,
            cut_out,
            cut_order,
            min_source_in,
            rescan_reasons,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClipMetadata, EntityRef, TimelineClip};
    use crate::timecode::Timecode;

    const FPS: f64 = 24.0;

    fn clip(index: usize, source_in: i64, source_out: i64) -> TimelineClip {
        let mut clip = TimelineClip::new(format!("clip{}", index), source_in, source_out);
        clip.index = index;
        clip
    }

    fn calculator(mapping: TimecodeMapping) -> RangeCalculator {
        RangeCalculator::new(FrameDefaults::default(), mapping)
    }

    fn previous_item(cut_item_in: i64, source_in: i64, source_out: i64) -> CutItem {
        CutItem {
            id: None,
            code: "clip1".into(),
            cut_order: 1,
            cut_item_in,
            cut_item_out: cut_item_in + source_out - source_in - 1,
            edit_in: 1,
            edit_out: source_out - source_in,
            timecode_cut_item_in: Timecode::from_frames(source_in, FPS).unwrap(),
            timecode_cut_item_out: Timecode::from_frames(source_out, FPS).unwrap(),
            timecode_edit_in: Timecode::zero(),
            timecode_edit_out: Timecode::zero(),
            shot: EntityRef::shot("A"),
            version: None,
        }
    }

    #[test]
    fn new_shot_absolute_mapping_cuts_at_default_head_in() {
        let c = clip(1, 240, 250);
        let resolved = ResolvedClip::new(&c, "A", FPS);
        let range = calculator(TimecodeMapping::Absolute)
            .compute(None, &[], &[&resolved])
            .unwrap();
        assert_eq!(range.cut_in, 1001);
        assert_eq!(range.cut_out, 1010);
        // Head handle sits before cut in
        assert_eq!(range.head_in, 993);
        assert_eq!(range.head_in_duration, 8);
        assert_eq!(range.tail_out_duration, 8);
        assert!(!range.needs_rescan());
    }

    #[test]
    fn new_shot_head_handle_ends_before_cut_in() {
        let c = clip(1, 240, 250);
        let resolved = ResolvedClip::new(&c, "A", FPS);
        let range = calculator(TimecodeMapping::Absolute)
            .compute(None, &[], &[&resolved])
            .unwrap();
        let mut shot = Shot::new("A");
        range.apply(&mut shot);

        let head_in = shot.head_in.unwrap();
        let head_out = shot.head_out().unwrap();
        let cut_in = shot.cut_in.unwrap();
        assert!(head_in <= head_out && head_out < cut_in);
        assert_eq!(head_out, cut_in - 1);
        assert_eq!(shot.working_duration(), Some(8 + 10 + 8));
    }

    #[test]
    fn automatic_first_import_needs_no_rescan() {
        let c = clip(1, 100, 110);
        let resolved = ResolvedClip::new(&c, "A", FPS);
        let range = calculator(TimecodeMapping::Automatic)
            .compute(None, &[], &[&resolved])
            .unwrap();
        assert_eq!(range.cut_in, 100);
        assert_eq!(range.head_in, 92);
        assert_eq!(range.head_in_duration, 8);
        assert!(!range.needs_rescan());
    }

    #[test]
    fn new_shot_relative_mapping() {
        let c = clip(1, 11, 21);
        let resolved = ResolvedClip::new(&c, "A", FPS);
        let mapping = TimecodeMapping::from_mode(2, Some(("00:00:00:01", 1001))).unwrap();
        let range = calculator(mapping).compute(None, &[], &[&resolved]).unwrap();
        assert_eq!(range.cut_in, 1011);
        // Default head in leaves room, so the handle covers the whole gap
        assert_eq!(range.head_in, 1001);
        assert_eq!(range.head_in_duration, 10);
    }

    #[test]
    fn clip_overrides_apply_to_new_shots() {
        let c = clip(1, 0, 10).with_metadata(ClipMetadata {
            head_in: Some(101),
            head_in_duration: Some(12),
            tail_out_duration: Some(16),
            ..ClipMetadata::default()
        });
        let resolved = ResolvedClip::new(&c, "A", FPS);
        let range = calculator(TimecodeMapping::Absolute)
            .compute(None, &[], &[&resolved])
            .unwrap();
        assert_eq!(range.cut_in, 101);
        assert_eq!(range.head_in, 89);
        assert_eq!(range.head_in_duration, 12);
        assert_eq!(range.tail_out_duration, 16);
    }

    #[test]
    fn existing_shot_continues_previous_range() {
        let shot = Shot {
            head_in: Some(1001),
            head_in_duration: Some(8),
            tail_out_duration: Some(8),
            cut_in: Some(1009),
            cut_out: Some(1018),
            ..Shot::new("A")
        };
        let previous = previous_item(1009, 100, 110);
        // Head extended by 4, tail extended by 6
        let c = clip(1, 96, 116);
        let resolved = ResolvedClip::new(&c, "A", FPS);

        let range = calculator(TimecodeMapping::Automatic)
            .compute(Some(&shot), &[&previous], &[&resolved])
            .unwrap();
        assert_eq!(range.cut_in, 1005);
        assert_eq!(range.cut_out, 1024);
        // Head in and tail out stay where they were
        assert_eq!(range.head_in, 1001);
        assert_eq!(range.head_in_duration, 4);
        assert_eq!(range.tail_out_duration, 8);
        assert!(!range.needs_rescan());
    }

    #[test]
    fn range_outside_handles_needs_rescan() {
        let shot = Shot {
            head_in: Some(1001),
            head_in_duration: Some(8),
            tail_out_duration: Some(8),
            cut_in: Some(1009),
            cut_out: Some(1018),
            ..Shot::new("A")
        };
        let previous = previous_item(1009, 100, 110);
        let c = clip(1, 90, 130);
        let resolved = ResolvedClip::new(&c, "A", FPS);

        let range = calculator(TimecodeMapping::Absolute)
            .compute(Some(&shot), &[&previous], &[&resolved])
            .unwrap();
        assert_eq!(range.cut_in, 999);
        assert_eq!(range.cut_out, 1038);
        assert_eq!(range.head_in_duration, -2);
        assert_eq!(range.rescan_reasons.len(), 2);
        // Previous tail out 1026 is still covered
        assert_eq!(range.tail_out_duration, 8);
    }

    #[test]
    fn known_shot_outside_previous_cut_keeps_cut_in() {
        let shot = Shot {
            cut_in: Some(1100),
            ..Shot::new("A")
        };
        let c = clip(3, 0, 10);
        let resolved = ResolvedClip::new(&c, "A", FPS);
        let range = calculator(TimecodeMapping::Automatic)
            .compute(Some(&shot), &[], &[&resolved])
            .unwrap();
        assert_eq!(range.cut_in, 1100);
        assert_eq!(range.cut_order, 3);
    }

    #[test]
    fn range_spans_all_clips_of_the_shot() {
        let first = clip(1, 100, 110);
        let second = clip(3, 90, 105);
        let a = ResolvedClip::new(&first, "A", FPS);
        let b = ResolvedClip::new(&second, "A", FPS);
        let range = calculator(TimecodeMapping::Absolute)
            .compute(None, &[], &[&a, &b])
            .unwrap();
        assert_eq!(range.min_source_in, 90);
        assert_eq!(range.cut_out, 1001 + 20 - 1);
        assert_eq!(range.cut_item_in(100), 1011);
        assert_eq!(range.cut_order, 1);
    }
}
