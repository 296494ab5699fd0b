//! Tracking-system entities touched by reconciliation.

use serde::{Deserialize, Serialize};

use crate::timecode::Timecode;

use super::status::ShotStatus;

/// Key identifying a Shot within a reconciliation scope.
///
/// Shot names are matched case-insensitively.
pub fn shot_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Reference to an entity, resolved by id once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity type name ("Shot", "Version", "Sequence"...).
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Store id, unset until the entity is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Entity code or name.
    pub name: String,
}

impl EntityRef {
    /// Reference an entity that is not persisted yet.
    pub fn new(entity_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: None,
            name: name.into(),
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn shot(name: impl Into<String>) -> Self {
        Self::new("Shot", name)
    }

    pub fn version(name: impl Into<String>) -> Self {
        Self::new("Version", name)
    }
}

/// A tracked Shot and its cut information.
///
/// Frame fields are optional because Shots may be created or edited outside
/// of cut imports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub status: Option<ShotStatus>,
    #[serde(default)]
    pub head_in: Option<i64>,
    #[serde(default)]
    pub head_in_duration: Option<i64>,
    #[serde(default)]
    pub tail_out_duration: Option<i64>,
    #[serde(default)]
    pub cut_in: Option<i64>,
    #[serde(default)]
    pub cut_out: Option<i64>,
    #[serde(default)]
    pub cut_order: Option<usize>,
}

impl Shot {
    /// Create a Shot with no cut information.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            status: None,
            head_in: None,
            head_in_duration: None,
            tail_out_duration: None,
            cut_in: None,
            cut_out: None,
            cut_order: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<ShotStatus>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn key(&self) -> String {
        shot_key(&self.name)
    }

    /// Reference to this Shot.
    pub fn to_ref(&self) -> EntityRef {
        EntityRef {
            entity_type: "Shot".to_string(),
            id: self.id,
            name: self.name.clone(),
        }
    }

    /// Last frame of the head handles, one frame before cut in.
    pub fn head_out(&self) -> Option<i64> {
        Some(self.head_in? + self.head_in_duration? - 1)
    }

    /// First frame of the tail handles.
    pub fn tail_in(&self) -> Option<i64> {
        self.cut_out.map(|cut_out| cut_out + 1)
    }

    /// Last frame of the tail handles.
    pub fn tail_out(&self) -> Option<i64> {
        Some(self.cut_out? + self.tail_out_duration?)
    }

    /// Frames between cut in and cut out, both included.
    pub fn cut_duration(&self) -> Option<i64> {
        Some(self.cut_out? - self.cut_in? + 1)
    }

    /// Frames from head in to tail out.
    pub fn working_duration(&self) -> Option<i64> {
        Some(self.tail_out()? - self.head_in? + 1)
    }
}

/// Placement of one clip inside a Cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Unique cut item name within the Cut.
    pub code: String,
    /// 1-based clip position.
    pub cut_order: usize,
    /// First Shot frame used, inclusive.
    pub cut_item_in: i64,
    /// Last Shot frame used, inclusive.
    pub cut_item_out: i64,
    /// First timeline frame, 1-based inclusive.
    pub edit_in: i64,
    /// Last timeline frame, 1-based inclusive.
    pub edit_out: i64,
    /// Source timecode of the first frame.
    pub timecode_cut_item_in: Timecode,
    /// Source timecode right after the last frame.
    pub timecode_cut_item_out: Timecode,
    /// Record timecode of the first frame.
    pub timecode_edit_in: Timecode,
    /// Record timecode right after the last frame.
    pub timecode_edit_out: Timecode,
    pub shot: EntityRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<EntityRef>,
}

impl CutItem {
    /// Frames covered by the item.
    pub fn cut_item_duration(&self) -> i64 {
        self.cut_item_out - self.cut_item_in + 1
    }

    /// Whether two items describe the same placement, ignoring store ids.
    pub fn same_placement(&self, other: &CutItem) -> bool {
        self.code == other.code
            && self.cut_order == other.cut_order
            && self.cut_item_in == other.cut_item_in
            && self.cut_item_out == other.cut_item_out
            && self.edit_in == other.edit_in
            && self.edit_out == other.edit_out
            && self.timecode_cut_item_in == other.timecode_cut_item_in
            && self.timecode_cut_item_out == other.timecode_cut_item_out
            && self.timecode_edit_in == other.timecode_edit_in
            && self.timecode_edit_out == other.timecode_edit_out
            && shot_key(&self.shot.name) == shot_key(&other.shot.name)
            && self.version.as_ref().map(|v| &v.name) == other.version.as_ref().map(|v| &v.name)
    }
}

/// A published media instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    /// Shot, or the Cut link when the clip has no Shot.
    pub entity_link: EntityRef,
    /// Local storage the path is relative to.
    pub local_storage: String,
    /// Publish path relative to the local storage.
    pub path: String,
    /// Media the Version is published from.
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_frame: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_frame: Option<i64>,
}

/// A Cut revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cut {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Cut title.
    pub code: String,
    pub project: String,
    /// Entity the Cut belongs to (Sequence, Reel...), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_link: Option<EntityRef>,
    pub revision_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
    pub timecode_start: Timecode,
    pub timecode_end: Timecode,
    /// Total duration in frames, gaps included.
    pub duration: i64,
}
