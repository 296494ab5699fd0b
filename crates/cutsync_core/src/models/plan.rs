//! Output of a reconciliation pass: the entity mutations to persist.

use serde::{Deserialize, Serialize};

use crate::diff::DiffEntry;
use crate::reconcile::{ClipError, ClipWarning};

use super::entities::{Cut, CutItem, Shot, Version};
use super::snapshot::CutSnapshot;
use super::status::ShotStatus;

/// Changed Shot fields; unset fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ShotStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_in_duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail_out_duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_out: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_order: Option<usize>,
}

/// Value of `after` when it is set and differs from `before`.
fn changed<T: PartialEq + Clone>(before: &Option<T>, after: &Option<T>) -> Option<T> {
    match after {
        Some(value) if before.as_ref() != Some(value) => Some(value.clone()),
        _ => None,
    }
}

impl ShotChanges {
    /// Fields that differ between two states of the same Shot.
    pub fn between(before: &Shot, after: &Shot) -> Self {
        Self {
            status: changed(&before.status, &after.status),
            head_in: changed(&before.head_in, &after.head_in),
            head_in_duration: changed(&before.head_in_duration, &after.head_in_duration),
            tail_out_duration: changed(&before.tail_out_duration, &after.tail_out_duration),
            cut_in: changed(&before.cut_in, &after.cut_in),
            cut_out: changed(&before.cut_out, &after.cut_out),
            cut_order: changed(&before.cut_order, &after.cut_order),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Write the changed fields onto a Shot.
    pub fn apply(&self, shot: &mut Shot) {
        if let Some(status) = &self.status {
            shot.status = Some(status.clone());
        }
        if self.head_in.is_some() {
            shot.head_in = self.head_in;
        }
        if self.head_in_duration.is_some() {
            shot.head_in_duration = self.head_in_duration;
        }
        if self.tail_out_duration.is_some() {
            shot.tail_out_duration = self.tail_out_duration;
        }
        if self.cut_in.is_some() {
            shot.cut_in = self.cut_in;
        }
        if self.cut_out.is_some() {
            shot.cut_out = self.cut_out;
        }
        if self.cut_order.is_some() {
            shot.cut_order = self.cut_order;
        }
    }
}

/// Update of an existing Shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    pub changes: ShotChanges,
}

/// Status a Shot had right before being omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub shot: String,
    pub status: ShotStatus,
}

/// Mutations computed by one reconciliation pass.
///
/// Entities reference each other by name; ids are resolved when the plan is
/// applied to a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationPlan {
    pub shots_to_create: Vec<Shot>,
    pub shot_updates: Vec<ShotUpdate>,
    /// New Cut revision, unset when the Cut is unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut: Option<Cut>,
    /// Items of the new Cut revision, in cut order.
    pub cut_items: Vec<CutItem>,
    pub versions_to_create: Vec<Version>,
    pub status_history_updates: Vec<StatusRecord>,
    /// Cut change report.
    pub report: Vec<DiffEntry>,
    pub errors: Vec<ClipError>,
    pub warnings: Vec<ClipWarning>,
    #[serde(skip)]
    pub(crate) resulting: CutSnapshot,
}

impl MutationPlan {
    /// Whether the plan mutates nothing. Report, errors and warnings are ignored.
    pub fn is_empty(&self) -> bool {
        self.shots_to_create.is_empty()
            && self.shot_updates.is_empty()
            && self.cut.is_none()
            && self.cut_items.is_empty()
            && self.versions_to_create.is_empty()
            && self.status_history_updates.is_empty()
    }

    /// Tracked state once the plan is applied.
    pub fn resulting_snapshot(&self) -> &CutSnapshot {
        &self.resulting
    }

    /// Number of mutations in the plan.
    pub fn mutation_count(&self) -> usize {
        self.shots_to_create.len()
            + self.shot_updates.len()
            + usize::from(self.cut.is_some())
            + self.cut_items.len()
            + self.versions_to_create.len()
            + self.status_history_updates.len()
    }

    /// Serialize the plan to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
