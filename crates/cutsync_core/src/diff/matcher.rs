//! Matching of timeline clips against the items of a previous Cut.

use std::collections::{HashMap, HashSet};

use super::types::{AddedClip, CutDiff, MatchedClip, RemovedItem, ResolvedClip};
use crate::models::{shot_key, CutItem};
use crate::reconcile::ConfigurationError;

/// Align clips with previous CutItems by Shot identity.
///
/// The first clip of a Shot, in timeline order, is matched with the Shot's
/// first previous item. Later clips of the same Shot are added, previous
/// items left without a match are removed.
///
/// Fails when a previous item timecode cannot be expressed at the clip
/// frame rate.
pub fn match_cut<'a>(
    clips: &[ResolvedClip<'a>],
    previous: &'a [CutItem],
) -> Result<CutDiff<'a>, ConfigurationError> {
    let mut ordered: Vec<&'a CutItem> = previous.iter().collect();
    ordered.sort_by_key(|item| item.cut_order);

    // Position in `ordered` of the first previous item of each Shot
    let mut first_item: HashMap<String, usize> = HashMap::new();
    for (position, item) in ordered.iter().enumerate() {
        first_item
            .entry(shot_key(&item.shot.name))
            .or_insert(position);
    }

    let mut diff = CutDiff::default();
    let mut seen_shots = HashSet::new();
    let mut matched = HashSet::new();

    let mut clips: Vec<&ResolvedClip<'a>> = clips.iter().collect();
    clips.sort_by_key(|resolved| resolved.clip.index);

    for resolved in clips {
        let key = resolved.shot_key();
        if !seen_shots.insert(key.clone()) {
            diff.added.push(AddedClip {
                resolved: resolved.clone(),
                repeated: true,
            });
            continue;
        }
        match first_item.get(&key) {
            Some(&position) => {
                matched.insert(position);
                diff.unchanged.push(compare(resolved, ordered[position])?);
            }
            None => diff.added.push(AddedClip {
                resolved: resolved.clone(),
                repeated: false,
            }),
        }
    }

    for (position, item) in ordered.into_iter().enumerate() {
        if matched.contains(&position) {
            continue;
        }
        diff.removed.push(RemovedItem {
            item,
            shot_still_used: seen_shots.contains(&shot_key(&item.shot.name)),
        });
    }

    tracing::debug!(
        "Matched {} clip(s), {} added, {} removed",
        diff.unchanged.len(),
        diff.added.len(),
        diff.removed.len()
    );
    Ok(diff)
}

/// Compare a clip with the previous item of its Shot.
fn compare<'a>(
    resolved: &ResolvedClip<'a>,
    previous: &'a CutItem,
) -> Result<MatchedClip<'a>, ConfigurationError> {
    let clip = resolved.clip;
    let old_in = previous
        .timecode_cut_item_in
        .to_frames(resolved.fps)
        .map_err(|e| ConfigurationError::timecode(&clip.name, e))?;
    let old_out = previous
        .timecode_cut_item_out
        .to_frames(resolved.fps)
        .map_err(|e| ConfigurationError::timecode(&clip.name, e))?;

    let mut reasons = retime_reasons(clip.source_in - old_in, clip.source_out - old_out);
    let retimed = !reasons.is_empty();

    let reordered = previous.cut_order != clip.index;
    if reordered {
        reasons.push(format!(
            "Cut order changed from {} to {}",
            previous.cut_order, clip.index
        ));
    }

    Ok(MatchedClip {
        resolved: resolved.clone(),
        previous,
        retimed,
        reordered,
        reasons,
    })
}

/// Describe a change of source range in terms of the media the edit uses.
///
/// Deltas are new minus previous source frames. "Extended" means the clip
/// now uses more media at that end, "trimmed" that it uses less:
/// - head: an earlier source in extends, a later one trims;
/// - tail: a later source out extends, an earlier one trims.
fn retime_reasons(head_delta: i64, tail_delta: i64) -> Vec<String> {
    let mut reasons = Vec::new();
    match head_delta {
        d if d > 0 => reasons.push(format!("Head trimmed {} frs", d)),
        d if d < 0 => reasons.push(format!("Head extended {} frs", -d)),
        _ => {}
    }
    match tail_delta {
        d if d > 0 => reasons.push(format!("Tail extended {} frs", d)),
        d if d < 0 => reasons.push(format!("Tail trimmed {} frs", -d)),
        _ => {}
    }
    reasons
}
