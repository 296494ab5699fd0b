//! Cut item matching and the cut change report types.

mod matcher;
mod types;

pub use matcher::match_cut;
pub use types::{AddedClip, CutDiff, DiffEntry, DiffType, MatchedClip, RemovedItem, ResolvedClip};
