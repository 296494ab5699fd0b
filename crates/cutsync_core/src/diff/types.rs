//! Types describing how a new timeline differs from a previous Cut.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{shot_key, CutItem, TimelineClip};

/// Clip with its resolved Shot name and effective frame rate.
#[derive(Debug, Clone)]
pub struct ResolvedClip<'a> {
    pub clip: &'a TimelineClip,
    pub shot_name: String,
    pub fps: f64,
}

impl<'a> ResolvedClip<'a> {
    pub fn new(clip: &'a TimelineClip, shot_name: impl Into<String>, fps: f64) -> Self {
        Self {
            clip,
            shot_name: shot_name.into(),
            fps,
        }
    }

    pub fn shot_key(&self) -> String {
        shot_key(&self.shot_name)
    }
}

/// New clip paired with the previous CutItem of the same Shot.
#[derive(Debug, Clone)]
pub struct MatchedClip<'a> {
    pub resolved: ResolvedClip<'a>,
    pub previous: &'a CutItem,
    /// Source range differs from the previous item.
    pub retimed: bool,
    /// Clip moved to a different cut order.
    pub reordered: bool,
    /// Human readable description of range changes.
    pub reasons: Vec<String>,
}

/// New clip with no previous counterpart.
#[derive(Debug, Clone)]
pub struct AddedClip<'a> {
    pub resolved: ResolvedClip<'a>,
    /// An earlier clip of this timeline already uses the Shot.
    pub repeated: bool,
}

/// Previous CutItem with no new counterpart.
#[derive(Debug, Clone)]
pub struct RemovedItem<'a> {
    pub item: &'a CutItem,
    /// The Shot is still used by another clip of the new timeline.
    pub shot_still_used: bool,
}

/// Result of matching a timeline against a previous Cut.
#[derive(Debug, Clone, Default)]
pub struct CutDiff<'a> {
    pub unchanged: Vec<MatchedClip<'a>>,
    pub added: Vec<AddedClip<'a>>,
    pub removed: Vec<RemovedItem<'a>>,
}

impl<'a> CutDiff<'a> {
    /// Whether a Shot is used by any new clip.
    pub fn uses_shot(&self, key: &str) -> bool {
        self.unchanged.iter().any(|m| m.resolved.shot_key() == key)
            || self.added.iter().any(|a| a.resolved.shot_key() == key)
    }

    /// Number of new clips matched or added.
    pub fn clip_count(&self) -> usize {
        self.unchanged.len() + self.added.len()
    }

    /// Previous item matched to the clip at `index`, if any.
    pub fn previous_for_clip(&self, index: usize) -> Option<&'a CutItem> {
        self.unchanged
            .iter()
            .find(|m| m.resolved.clip.index == index)
            .map(|m| m.previous)
    }

    /// Whether any entry changed.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty()
            || !self.removed.is_empty()
            || self.unchanged.iter().any(|m| m.retimed || m.reordered)
    }
}

/// Classification of one entry of the cut change report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffType {
    /// Same Shot, same range.
    NoChange,
    /// Same Shot, range or order changed.
    CutChange,
    /// Range exceeds the media covered by the Shot handles.
    Rescan,
    /// Shot does not exist yet.
    New,
    /// Existing Shot not used by the previous Cut.
    NewInCut,
    /// Shot no longer used; it gets omitted.
    Omitted,
    /// Previous item dropped, Shot still used elsewhere in the Cut.
    OmittedInCut,
    /// Omitted Shot used again.
    Reinstated,
    /// No Shot could be resolved for the clip.
    NoLink,
}

impl fmt::Display for DiffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiffType::NoChange => "No Change",
            DiffType::CutChange => "Cut Change",
            DiffType::Rescan => "Rescan Needed",
            DiffType::New => "New",
            DiffType::NewInCut => "New in Cut",
            DiffType::Omitted => "Omitted",
            DiffType::OmittedInCut => "Omitted in Cut",
            DiffType::Reinstated => "Reinstated",
            DiffType::NoLink => "No Link",
        };
        f.write_str(label)
    }
}

/// One line of the cut change report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub diff_type: DiffType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot: Option<String>,
    /// Clip name, unset for removed items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_index: Option<usize>,
    /// Cut order in the previous Cut.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_cut_order: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.diff_type,
            self.shot.as_deref().unwrap_or("<no shot>")
        )?;
        if let Some(clip) = &self.clip {
            write!(f, " ({})", clip)?;
        }
        if !self.reasons.is_empty() {
            write!(f, ": {}", self.reasons.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_entry_display() {
        let entry = DiffEntry {
            diff_type: DiffType::CutChange,
            shot: Some("SH010".into()),
            clip: Some("clip_1".into()),
            clip_index: Some(1),
            old_cut_order: Some(1),
            reasons: vec!["Head trimmed 2 frs".into()],
        };
        assert_eq!(
            entry.to_string(),
            "[Cut Change] SH010 (clip_1): Head trimmed 2 frs"
        );
    }

    #[test]
    fn diff_type_serializes_snake_case() {
        let json = serde_json::to_string(&DiffType::OmittedInCut).unwrap();
        assert_eq!(json, "\"omitted_in_cut\"");
    }
}
