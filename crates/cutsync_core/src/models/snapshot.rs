//! Read-only view of the tracked state a reconciliation pass starts from.

use serde::{Deserialize, Serialize};

use super::entities::{shot_key, Cut, CutItem, EntityRef, Shot};
use super::status::StatusHistory;

/// Where a Cut is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutTarget {
    /// Project name.
    pub project: String,
    /// Entity the Cut and its Shots are linked to (Sequence, Reel...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_link: Option<EntityRef>,
}

impl CutTarget {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            entity_link: None,
        }
    }

    pub fn with_link(mut self, link: EntityRef) -> Self {
        self.entity_link = Some(link);
        self
    }

    /// Name used for the `LINK` path token.
    pub fn link_name(&self) -> &str {
        self.entity_link
            .as_ref()
            .map(|link| link.name.as_str())
            .unwrap_or(&self.project)
    }
}

/// Previous Cut plus every Shot in the reconciliation scope.
///
/// `shots` also holds Shots absent from the previous Cut, so Shots omitted
/// in an earlier pass can be reinstated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CutSnapshot {
    /// Previous Cut revision, if one was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut: Option<Cut>,
    /// Items of the previous Cut, in cut order.
    #[serde(default)]
    pub items: Vec<CutItem>,
    #[serde(default)]
    pub shots: Vec<Shot>,
    #[serde(default)]
    pub status_history: StatusHistory,
}

impl CutSnapshot {
    /// Snapshot of a recorded Cut.
    pub fn new(cut: Cut, items: Vec<CutItem>, shots: Vec<Shot>) -> Self {
        Self {
            cut: Some(cut),
            items,
            shots,
            status_history: StatusHistory::new(),
        }
    }

    /// Snapshot with known Shots but no previous Cut.
    pub fn shots_only(shots: Vec<Shot>) -> Self {
        Self {
            shots,
            ..Self::default()
        }
    }

    pub fn with_status_history(mut self, history: StatusHistory) -> Self {
        self.status_history = history;
        self
    }

    /// Whether a previous Cut exists to diff against.
    pub fn has_cut(&self) -> bool {
        self.cut.is_some()
    }

    /// Look up a Shot by name, ignoring case.
    pub fn shot(&self, name: &str) -> Option<&Shot> {
        let key = shot_key(name);
        self.shots.iter().find(|shot| shot.key() == key)
    }

    /// Mutable Shot lookup, ignoring case.
    pub fn shot_mut(&mut self, name: &str) -> Option<&mut Shot> {
        let key = shot_key(name);
        self.shots.iter_mut().find(|shot| shot.key() == key)
    }

    /// Previous items referencing a Shot, in cut order.
    pub fn items_for_shot(&self, name: &str) -> Vec<&CutItem> {
        let key = shot_key(name);
        self.items
            .iter()
            .filter(|item| shot_key(&item.shot.name) == key)
            .collect()
    }

    /// Frame rate of the previous Cut, if recorded.
    pub fn frame_rate(&self) -> Option<f64> {
        self.cut.as_ref().and_then(|cut| cut.frame_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shot_lookup_ignores_case() {
        let snapshot = CutSnapshot::shots_only(vec![Shot::new("SH010"), Shot::new("sh020")]);
        assert!(snapshot.shot("sh010").is_some());
        assert!(snapshot.shot("SH020").is_some());
        assert!(snapshot.shot("sh030").is_none());
        assert!(!snapshot.has_cut());
    }

    #[test]
    fn link_name_defaults_to_project() {
        let target = CutTarget::new("demo");
        assert_eq!(target.link_name(), "demo");

        let target = target.with_link(EntityRef::new("Sequence", "seq_01"));
        assert_eq!(target.link_name(), "seq_01");
    }
}
