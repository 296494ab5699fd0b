//! Shot status values and the pre-omit status side-table.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Free-text Shot status as stored by the tracking system.
///
/// The set of values is site-defined, so statuses only support equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShotStatus(String);

impl ShotStatus {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShotStatus {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Status given to a reinstated Shot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReinstateStatus {
    /// Restore the status recorded right before the Shot was omitted.
    #[default]
    PreviousStatus,
    /// Set a fixed status.
    Status(ShotStatus),
}

impl ReinstateStatus {
    /// Text used for the sentinel in settings files.
    pub const PREVIOUS_STATUS: &'static str = "Previous Status";

    /// Parse a settings value, recognizing the sentinel case-insensitively.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case(Self::PREVIOUS_STATUS) {
            Self::PreviousStatus
        } else {
            Self::Status(ShotStatus::new(value))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::PreviousStatus => Self::PREVIOUS_STATUS,
            Self::Status(status) => status.as_str(),
        }
    }
}

impl Serialize for ReinstateStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ReinstateStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// Status each Shot had immediately before its last omit transition.
///
/// Keyed by Shot key (lower-cased name). Persisted by the caller across passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusHistory(BTreeMap<String, ShotStatus>);

impl StatusHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status recorded for a Shot, if any.
    pub fn get(&self, shot_key: &str) -> Option<&ShotStatus> {
        self.0.get(shot_key)
    }

    /// Record the status a Shot had before being omitted.
    pub fn record(&mut self, shot_key: impl Into<String>, status: ShotStatus) {
        self.0.insert(shot_key.into(), status);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ShotStatus)> {
        self.0.iter()
    }
}
