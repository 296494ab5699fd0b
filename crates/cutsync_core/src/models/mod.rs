//! Data models shared by the reconciliation components.

mod entities;
mod plan;
mod snapshot;
mod status;
mod timeline;

pub use entities::{shot_key, Cut, CutItem, EntityRef, Shot, Version};
pub use plan::{MutationPlan, ShotChanges, ShotUpdate, StatusRecord};
pub use snapshot::{CutSnapshot, CutTarget};
pub use status::{ReinstateStatus, ShotStatus, StatusHistory};
pub use timeline::{
    ClipMetadata, FrameRange, Gap, MediaReference, Marker, TimelineClip, Timeline, TimelineItem,
};
