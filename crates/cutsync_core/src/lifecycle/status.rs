//! Shot status transitions: omit and reinstate.

use crate::config::ShotSettings;
use crate::models::{ReinstateStatus, Shot, ShotStatus, StatusHistory};

/// Status change decided for one Shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// No status change.
    Unchanged,
    /// Shot left the Cut. `previous` is the status to record in the history.
    Omit {
        status: ShotStatus,
        previous: Option<ShotStatus>,
    },
    /// Shot is back in the Cut.
    Reinstate { status: ShotStatus },
    /// Shot is back in the Cut but no pre-omit status was recorded.
    MissingPreviousStatus,
}

/// Omit and reinstate rules configured for a pass.
#[derive(Debug, Clone)]
pub struct StatusPolicy {
    omit_status: ShotStatus,
    reinstate_status: ReinstateStatus,
    reinstate_if: Vec<ShotStatus>,
}

impl StatusPolicy {
    pub fn new(
        omit_status: ShotStatus,
        reinstate_status: ReinstateStatus,
        reinstate_if: Vec<ShotStatus>,
    ) -> Self {
        Self {
            omit_status,
            reinstate_status,
            reinstate_if,
        }
    }

    pub fn from_settings(settings: &ShotSettings) -> Self {
        Self::new(
            settings.shot_omit_status.clone(),
            settings.shot_reinstate_status.clone(),
            settings.reinstate_shot_if_status_is.clone(),
        )
    }

    pub fn omit_status(&self) -> &ShotStatus {
        &self.omit_status
    }

    /// Whether a used Shot with this status gets reinstated.
    pub fn is_reinstatable(&self, status: Option<&ShotStatus>) -> bool {
        status.is_some_and(|status| self.reinstate_if.contains(status))
    }

    /// Transition for a Shot of the previous Cut that no clip uses anymore.
    pub fn on_unused(&self, shot: &Shot) -> Transition {
        if shot.status.as_ref() == Some(&self.omit_status) {
            return Transition::Unchanged;
        }
        Transition::Omit {
            status: self.omit_status.clone(),
            previous: shot.status.clone(),
        }
    }

    /// Transition for an existing Shot used by the new timeline.
    pub fn on_used(&self, shot: &Shot, history: &StatusHistory) -> Transition {
        if !self.is_reinstatable(shot.status.as_ref()) {
            return Transition::Unchanged;
        }
        match &self.reinstate_status {
            ReinstateStatus::Status(status) => Transition::Reinstate {
                status: status.clone(),
            },
            ReinstateStatus::PreviousStatus => match history.get(&shot.key()) {
                Some(status) => Transition::Reinstate {
                    status: status.clone(),
                },
                None => Transition::MissingPreviousStatus,
            },
        }
    }
}
