//! Reconciliation pass composing name resolution, matching, Shot lifecycle
//! and Version naming into a [`MutationPlan`].
//!
//! A pass runs in order:
//! 1. Resolve a Shot name and frame rate for every clip
//! 2. Match clips against the previous Cut
//! 3. Compute frame values and status transitions per Shot
//! 4. Omit Shots that left the Cut
//! 5. Lay out CutItems on the timeline, creating missing Versions
//! 6. Compare with the previous Cut and build the change report

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::clock::{Clock, SystemClock};
use super::errors::{ClipError, ClipWarning, ConfigurationError, ReconcileResult};
use crate::config::Settings;
use crate::diff::{match_cut, CutDiff, DiffEntry, DiffType, ResolvedClip};
use crate::lifecycle::{FrameDefaults, RangeCalculator, ShotRange, StatusPolicy, Transition};
use crate::models::{
    shot_key, Cut, CutItem, CutSnapshot, CutTarget, EntityRef, MutationPlan, Shot, ShotChanges,
    ShotUpdate, StatusHistory, StatusRecord, Timeline, TimelineClip, TimelineItem, Version,
};
use crate::naming::{
    CutItemNames, PathContext, PathTemplate, ShotNameResolver, VersionNameContext, VersionNamer,
};
use crate::timecode::Timecode;

/// Reusable reconciliation engine built from validated settings.
///
/// Building the reconciler checks the mapping mode, compiles the Shot name
/// pattern and parses the templates, so a pass only fails on inputs.
pub struct Reconciler {
    resolver: ShotNameResolver,
    ranges: RangeCalculator,
    status: StatusPolicy,
    version_namer: VersionNamer,
    path_template: PathTemplate,
    local_storage: String,
    create_missing_versions: bool,
    clock: Arc<dyn Clock>,
    seed: Option<u64>,
}

impl Reconciler {
    /// Build a reconciler from settings.
    pub fn new(settings: &Settings) -> ReconcileResult<Self> {
        settings.validate()?;
        let mapping = settings.cut.timecode_mapping()?;
        Ok(Self {
            resolver: ShotNameResolver::from_settings(&settings.shots)?,
            ranges: RangeCalculator::new(FrameDefaults::from_settings(&settings.cut), mapping),
            status: StatusPolicy::from_settings(&settings.shots),
            version_namer: VersionNamer::new(&settings.versions.version_names_template)?,
            path_template: PathTemplate::new(&settings.versions.versions_path_template)?,
            local_storage: settings.versions.local_storage_name.clone(),
            create_missing_versions: settings.versions.create_missing_versions,
            clock: Arc::new(SystemClock),
            seed: None,
        })
    }

    /// Use another time source for path date tokens.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Seed the random source of `UUID` tokens.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replace the Shot name strategy chain.
    pub fn with_resolver(mut self, resolver: ShotNameResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Reconcile a timeline against the previous state of its Cut.
    ///
    /// `previous` is `None` for a first import with no known Shots.
    pub fn reconcile(
        &self,
        timeline: &Timeline,
        target: &CutTarget,
        previous: Option<&CutSnapshot>,
    ) -> ReconcileResult<MutationPlan> {
        let empty = CutSnapshot::default();
        let snapshot = previous.unwrap_or(&empty);

        tracing::info!(
            "Reconciling '{}' ({} clip(s)) against {}",
            timeline.name,
            timeline.clip_count(),
            match &snapshot.cut {
                Some(cut) => format!("revision {} of '{}'", cut.revision_number, cut.code),
                None => "no previous Cut".to_string(),
            }
        );

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut pass = Pass {
            engine: self,
            timeline,
            target,
            snapshot,
            rng,
            plan: MutationPlan::default(),
            resulting_shots: snapshot.shots.clone(),
            status_history: snapshot.status_history.clone(),
        };

        let resolved = pass.resolve_clips()?;
        let record_fps = timeline
            .frame_rate
            .or_else(|| resolved.first().map(|r| r.fps))
            .or(snapshot.frame_rate());
        let diff = match_cut(&resolved, &snapshot.items)?;
        let outcomes = pass.update_used_shots(&resolved)?;
        pass.omit_unused_shots(&diff);
        let items = match record_fps {
            Some(fps) => pass.lay_out_items(&resolved, &outcomes, fps)?,
            None => Vec::new(),
        };
        pass.finish_cut(items, record_fps)?;
        pass.build_report(&resolved, &diff, &outcomes);

        let plan = pass.into_plan();
        tracing::info!(
            "Reconciled '{}': {} mutation(s), {} error(s), {} warning(s)",
            timeline.name,
            plan.mutation_count(),
            plan.errors.len(),
            plan.warnings.len()
        );
        Ok(plan)
    }
}

/// Reconcile once with settings that are not reused.
pub fn reconcile(
    timeline: &Timeline,
    target: &CutTarget,
    previous: Option<&CutSnapshot>,
    settings: &Settings,
) -> ReconcileResult<MutationPlan> {
    Reconciler::new(settings)?.reconcile(timeline, target, previous)
}

/// What a pass decided for one used Shot.
#[derive(Debug)]
struct ShotOutcome {
    name: String,
    shot_ref: EntityRef,
    range: ShotRange,
    is_new: bool,
    reinstated: bool,
}

/// State of one reconciliation pass.
struct Pass<'a> {
    engine: &'a Reconciler,
    timeline: &'a Timeline,
    target: &'a CutTarget,
    snapshot: &'a CutSnapshot,
    rng: StdRng,
    plan: MutationPlan,
    resulting_shots: Vec<Shot>,
    status_history: StatusHistory,
}

impl<'a> Pass<'a> {
    /// Resolve Shot names and frame rates, collecting per-clip errors.
    fn resolve_clips(&mut self) -> Result<Vec<ResolvedClip<'a>>, ConfigurationError> {
        let timeline = self.timeline;
        let snapshot = self.snapshot;
        let mut resolved = Vec::new();
        for clip in timeline.clips() {
            if clip.duration() <= 0 {
                tracing::warn!("Skipping clip '{}' (#{}): empty range", clip.name, clip.index);
                self.plan.errors.push(ClipError::EmptySourceRange {
                    clip: clip.name.clone(),
                    index: clip.index,
                    source_in: clip.source_in,
                    source_out: clip.source_out,
                });
                continue;
            }
            let name = match self.engine.resolver.resolve(clip) {
                Ok(name) => name,
                Err(err) => {
                    tracing::warn!("Skipping clip: {}", err);
                    self.plan.errors.push(err);
                    continue;
                }
            };
            let fps = timeline
                .clip_frame_rate(clip)
                .or(snapshot.frame_rate())
                .ok_or_else(|| ConfigurationError::unknown_frame_rate(&clip.name))?;
            // Keep the tracked spelling of known Shots
            let name = match snapshot.shot(&name) {
                Some(shot) => shot.name.clone(),
                None => name,
            };
            resolved.push(ResolvedClip::new(clip, name, fps));
        }
        Ok(resolved)
    }

    /// Frame values and reinstatement of every Shot used by the timeline.
    fn update_used_shots(
        &mut self,
        resolved: &[ResolvedClip<'a>],
    ) -> Result<HashMap<String, ShotOutcome>, ConfigurationError> {
        let snapshot = self.snapshot;
        // Shot keys in order of first use
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<&ResolvedClip<'a>>> = HashMap::new();
        for clip in resolved {
            let key = clip.shot_key();
            if !groups.contains_key(&key) {
                order.push(key.clone());
            }
            groups.entry(key).or_default().push(clip);
        }

        let mut outcomes = HashMap::new();
        for key in order {
            let clips = &groups[&key];
            let name = clips[0].shot_name.clone();
            let existing = snapshot.shot(&name);
            let previous_items = snapshot.items_for_shot(&name);
            let range = self.engine.ranges.compute(existing, &previous_items, clips)?;

            if range.needs_rescan() {
                self.plan.warnings.push(ClipWarning::NeedsRescan {
                    shot: name.clone(),
                    reason: range.rescan_reasons.join(", "),
                });
            }

            let mut reinstated = false;
            let outcome_ref;
            match existing {
                Some(shot) => {
                    let mut after = shot.clone();
                    range.apply(&mut after);
                    match self.engine.status.on_used(shot, &self.status_history) {
                        Transition::Reinstate { status } => {
                            tracing::info!(
                                "Reinstating Shot '{}': {} -> {}",
                                name,
                                shot.status.as_ref().map(|s| s.as_str()).unwrap_or("-"),
                                status
                            );
                            after.status = Some(status);
                            reinstated = true;
                        }
                        Transition::MissingPreviousStatus => {
                            let status = shot
                                .status
                                .as_ref()
                                .map(|s| s.to_string())
                                .unwrap_or_default();
                            tracing::warn!(
                                "No status recorded before Shot '{}' was omitted, keeping '{}'",
                                name,
                                status
                            );
                            self.plan
                                .warnings
                                .push(ClipWarning::MissingPreviousStatus {
                                    shot: name.clone(),
                                    status,
                                });
                        }
                        Transition::Unchanged | Transition::Omit { .. } => {}
                    }
                    outcome_ref = shot.to_ref();
                    self.record_update(shot, after);
                }
                None => {
                    let mut created = Shot::new(name.clone());
                    range.apply(&mut created);
                    tracing::debug!(
                        "New Shot '{}': cut {}-{}",
                        name,
                        range.cut_in,
                        range.cut_out
                    );
                    outcome_ref = created.to_ref();
                    self.resulting_shots.push(created.clone());
                    self.plan.shots_to_create.push(created);
                }
            }

            outcomes.insert(
                key,
                ShotOutcome {
                    name,
                    shot_ref: outcome_ref,
                    is_new: existing.is_none(),
                    reinstated,
                    range,
                },
            );
        }
        Ok(outcomes)
    }

    /// Omit the Shots of removed items no clip uses anymore.
    fn omit_unused_shots(&mut self, diff: &CutDiff<'a>) {
        let snapshot = self.snapshot;
        let mut handled = Vec::new();
        for removed in diff.removed.iter().filter(|r| !r.shot_still_used) {
            let key = shot_key(&removed.item.shot.name);
            if handled.contains(&key) {
                continue;
            }
            handled.push(key);

            let Some(shot) = snapshot.shot(&removed.item.shot.name) else {
                tracing::warn!(
                    "Shot '{}' of the previous Cut is not tracked, cannot omit it",
                    removed.item.shot.name
                );
                continue;
            };
            if let Transition::Omit { status, previous } = self.engine.status.on_unused(shot) {
                tracing::info!("Omitting Shot '{}'", shot.name);
                if let Some(previous) = previous {
                    self.status_history.record(shot.key(), previous.clone());
                    self.plan.status_history_updates.push(StatusRecord {
                        shot: shot.name.clone(),
                        status: previous,
                    });
                }
                let mut after = shot.clone();
                after.status = Some(status);
                self.record_update(shot, after);
            }
        }
    }

    /// Queue an update of an existing Shot if anything changed.
    fn record_update(&mut self, before: &Shot, after: Shot) {
        let changes = ShotChanges::between(before, &after);
        if changes.is_empty() {
            return;
        }
        let key = before.key();
        if let Some(shot) = self.resulting_shots.iter_mut().find(|s| s.key() == key) {
            changes.apply(shot);
        }
        self.plan.shot_updates.push(ShotUpdate {
            id: before.id,
            name: before.name.clone(),
            changes,
        });
    }

    /// CutItems in timeline order, with running edit positions.
    fn lay_out_items(
        &mut self,
        resolved: &[ResolvedClip<'a>],
        outcomes: &HashMap<String, ShotOutcome>,
        record_fps: f64,
    ) -> Result<Vec<CutItem>, ConfigurationError> {
        let timeline = self.timeline;
        let snapshot = self.snapshot;
        let by_index: HashMap<usize, &ResolvedClip<'a>> =
            resolved.iter().map(|r| (r.clip.index, r)).collect();
        let previous_by_code: HashMap<&str, &CutItem> = snapshot
            .items
            .iter()
            .map(|item| (item.code.as_str(), item))
            .collect();
        let record = RecordClock::new(timeline, record_fps)?;
        let now = self.engine.clock.now();

        let mut names = CutItemNames::new();
        let mut items = Vec::new();
        let mut position = 0i64;
        for entry in &timeline.items {
            let clip = match entry {
                TimelineItem::Gap(gap) => {
                    position += gap.duration.max(0);
                    continue;
                }
                TimelineItem::Clip(clip) => clip,
            };
            let duration = clip.duration().max(0);
            let Some(resolved) = by_index.get(&clip.index) else {
                position += duration;
                continue;
            };
            let Some(outcome) = outcomes.get(&resolved.shot_key()) else {
                position += duration;
                continue;
            };

            let code = names.next_name(&clip.name);
            let version = self.version_for(
                clip,
                &code,
                outcome,
                previous_by_code.get(code.as_str()).copied(),
                now,
            );
            let cut_item_in = outcome.range.cut_item_in(clip.source_in);
            let timecode = |result: Result<Timecode, _>| {
                result.map_err(|e| ConfigurationError::timecode(&clip.name, e))
            };

            items.push(CutItem {
                id: None,
                code,
                cut_order: clip.index,
                cut_item_in,
                cut_item_out: cut_item_in + duration - 1,
                edit_in: position + 1,
                edit_out: position + duration,
                timecode_cut_item_in: timecode(clip.source_in_timecode(resolved.fps))?,
                timecode_cut_item_out: timecode(clip.source_out_timecode(resolved.fps))?,
                timecode_edit_in: record.at(position, &clip.name)?,
                timecode_edit_out: record.at(position + duration, &clip.name)?,
                shot: outcome.shot_ref.clone(),
                version,
            });
            position += duration;
        }
        Ok(items)
    }

    /// Version referenced by a clip's CutItem, created when missing.
    fn version_for(
        &mut self,
        clip: &TimelineClip,
        code: &str,
        outcome: &ShotOutcome,
        previous: Option<&CutItem>,
        now: chrono::NaiveDateTime,
    ) -> Option<EntityRef> {
        let media = clip.media_reference.as_ref()?;
        if let Some(version) = &media.version {
            return Some(version.clone());
        }
        if let Some(reason) = &media.unavailable_reason {
            tracing::warn!("Media for clip '{}' is unavailable: {}", clip.name, reason);
            self.plan.warnings.push(ClipWarning::MediaUnavailable {
                clip: clip.name.clone(),
                index: clip.index,
                reason: reason.clone(),
            });
            return None;
        }
        // Version created by an earlier import of the same clip
        if let Some(version) = previous.and_then(|item| item.version.clone()) {
            return Some(version);
        }
        if !self.engine.create_missing_versions {
            return None;
        }

        let name = self.engine.version_namer.name(
            &VersionNameContext {
                clip_name: &clip.name,
                cut_item_name: code,
                shot: Some(&outcome.name),
                clip_index: clip.index,
            },
            &mut self.rng,
        );
        let path = self.engine.path_template.version_path(
            &PathContext {
                project: &self.target.project,
                cut_title: &self.timeline.name,
                link: self.target.link_name(),
                shot: Some(&outcome.name),
                now,
            },
            &name,
        );
        tracing::debug!("New Version '{}' for clip '{}'", name, clip.name);

        let version = Version {
            id: None,
            name: name.clone(),
            entity_link: outcome.shot_ref.clone(),
            local_storage: self.engine.local_storage.clone(),
            path,
            source: media.target.clone(),
            first_frame: media.available_range.map(|range| range.start),
            last_frame: media.available_range.map(|range| range.last()),
        };
        self.plan.versions_to_create.push(version);
        Some(EntityRef::version(name))
    }

    /// New Cut revision, dropped when identical to the previous one.
    fn finish_cut(
        &mut self,
        items: Vec<CutItem>,
        record_fps: Option<f64>,
    ) -> Result<(), ConfigurationError> {
        let snapshot = self.snapshot;
        let start = self.timeline.start_timecode.unwrap_or_else(Timecode::zero);
        let duration = self.timeline.duration();
        let timecode_end = match record_fps {
            Some(fps) => {
                let start_frames = start
                    .to_frames(fps)
                    .map_err(|e| ConfigurationError::timecode(&self.timeline.name, e))?;
                Timecode::from_frames(start_frames + duration, fps)
                    .map_err(|e| ConfigurationError::timecode(&self.timeline.name, e))?
            }
            None => start,
        };

        let previous = snapshot.cut.as_ref();
        let cut = Cut {
            id: None,
            code: self.timeline.name.clone(),
            project: self.target.project.clone(),
            entity_link: self.target.entity_link.clone(),
            revision_number: previous.map_or(1, |cut| cut.revision_number + 1),
            frame_rate: record_fps,
            timecode_start: start,
            timecode_end,
            duration,
        };

        let unchanged = previous.is_some_and(|previous| {
            same_cut_header(previous, &cut) && same_items(&snapshot.items, &items)
        });
        if unchanged {
            tracing::info!("Cut '{}' is unchanged", cut.code);
            self.plan.resulting.cut = snapshot.cut.clone();
            self.plan.resulting.items = snapshot.items.clone();
        } else {
            self.plan.resulting.cut = Some(cut.clone());
            self.plan.resulting.items = items.clone();
            self.plan.cut = Some(cut);
            self.plan.cut_items = items;
        }
        Ok(())
    }

    /// Cut change report: one entry per clip, then removed items.
    fn build_report(
        &mut self,
        resolved: &[ResolvedClip<'a>],
        diff: &CutDiff<'a>,
        outcomes: &HashMap<String, ShotOutcome>,
    ) {
        let by_index: HashMap<usize, &ResolvedClip<'a>> =
            resolved.iter().map(|r| (r.clip.index, r)).collect();

        let timeline = self.timeline;
        for clip in timeline.clips() {
            let Some(outcome) = by_index
                .get(&clip.index)
                .and_then(|r| outcomes.get(&r.shot_key()))
            else {
                self.plan.report.push(DiffEntry {
                    diff_type: DiffType::NoLink,
                    shot: None,
                    clip: Some(clip.name.clone()),
                    clip_index: Some(clip.index),
                    old_cut_order: None,
                    reasons: Vec::new(),
                });
                continue;
            };

            let matched = diff
                .unchanged
                .iter()
                .find(|m| m.resolved.clip.index == clip.index);
            let mut reasons = matched.map(|m| m.reasons.clone()).unwrap_or_default();
            let diff_type = if outcome.is_new {
                DiffType::New
            } else if outcome.reinstated {
                DiffType::Reinstated
            } else if outcome.range.needs_rescan() {
                reasons.extend(outcome.range.rescan_reasons.iter().cloned());
                DiffType::Rescan
            } else {
                match matched {
                    Some(m) if m.retimed || m.reordered => DiffType::CutChange,
                    Some(_) => DiffType::NoChange,
                    None => DiffType::NewInCut,
                }
            };

            self.plan.report.push(DiffEntry {
                diff_type,
                shot: Some(outcome.name.clone()),
                clip: Some(clip.name.clone()),
                clip_index: Some(clip.index),
                old_cut_order: matched.map(|m| m.previous.cut_order),
                reasons,
            });
        }

        for removed in &diff.removed {
            self.plan.report.push(DiffEntry {
                diff_type: if removed.shot_still_used {
                    DiffType::OmittedInCut
                } else {
                    DiffType::Omitted
                },
                shot: Some(removed.item.shot.name.clone()),
                clip: None,
                clip_index: None,
                old_cut_order: Some(removed.item.cut_order),
                reasons: Vec::new(),
            });
        }
    }

    fn into_plan(mut self) -> MutationPlan {
        self.plan.resulting.shots = self.resulting_shots;
        self.plan.resulting.status_history = self.status_history;
        self.plan
    }
}

/// Converts timeline positions to record timecodes.
struct RecordClock {
    fps: f64,
    start_frames: i64,
}

impl RecordClock {
    fn new(timeline: &Timeline, fps: f64) -> Result<Self, ConfigurationError> {
        let start_frames = timeline
            .start_timecode
            .unwrap_or_else(Timecode::zero)
            .to_frames(fps)
            .map_err(|e| ConfigurationError::timecode(&timeline.name, e))?;
        Ok(Self { fps, start_frames })
    }

    fn at(&self, position: i64, clip: &str) -> Result<Timecode, ConfigurationError> {
        Timecode::from_frames(self.start_frames + position, self.fps)
            .map_err(|e| ConfigurationError::timecode(clip, e))
    }
}

fn same_ref(left: Option<&EntityRef>, right: Option<&EntityRef>) -> bool {
    match (left, right) {
        (Some(l), Some(r)) => l.entity_type == r.entity_type && l.name == r.name,
        (None, None) => true,
        _ => false,
    }
}

/// Cut headers match, ignoring ids and revision numbers.
fn same_cut_header(previous: &Cut, new: &Cut) -> bool {
    previous.code == new.code
        && previous.project == new.project
        && same_ref(previous.entity_link.as_ref(), new.entity_link.as_ref())
        && previous.frame_rate == new.frame_rate
        && previous.timecode_start == new.timecode_start
        && previous.timecode_end == new.timecode_end
        && previous.duration == new.duration
}

fn same_items(previous: &[CutItem], new: &[CutItem]) -> bool {
    let mut previous: Vec<&CutItem> = previous.iter().collect();
    previous.sort_by_key(|item| item.cut_order);
    previous.len() == new.len()
        && previous
            .iter()
            .zip(new)
            .all(|(old, new)| old.same_placement(new))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::{FrameRange, MediaReference, ReinstateStatus, ShotStatus};
    use crate::reconcile::clock::FixedClock;

    fn settings() -> Settings {
        Settings::default()
    }

    fn reconciler(settings: &Settings) -> Reconciler {
        let now = NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Reconciler::new(settings)
            .unwrap()
            .with_clock(FixedClock(now))
            .with_seed(1)
    }

    fn target() -> CutTarget {
        CutTarget::new("demo")
    }

    fn timeline(shots: &[&str]) -> Timeline {
        let mut timeline = Timeline::new("reel_1").with_frame_rate(24.0);
        for (i, shot) in shots.iter().enumerate() {
            let start = 100 * (i as i64 + 1);
            timeline.push_clip(
                TimelineClip::new(format!("clip_{}", shot), start, start + 10).with_shot_name(*shot),
            );
        }
        timeline
    }

    fn shot<'p>(plan: &'p MutationPlan, name: &str) -> &'p Shot {
        plan.resulting_snapshot().shot(name).unwrap()
    }

    #[test]
    fn reconciler_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Reconciler>();
    }

    #[test]
    fn first_import_creates_shots_at_head_in() {
        let plan = reconciler(&settings())
            .reconcile(&timeline(&["A", "B", "C"]), &target(), None)
            .unwrap();

        assert_eq!(plan.shots_to_create.len(), 3);
        assert!(plan
            .shots_to_create
            .iter()
            .all(|shot| shot.cut_in == Some(1001) && shot.cut_out == Some(1010)));
        assert!(plan.shot_updates.is_empty());
        assert_eq!(plan.cut_items.len(), 3);
        assert_eq!(plan.cut.as_ref().map(|c| c.revision_number), Some(1));
        assert!(plan.report.iter().all(|e| e.diff_type == DiffType::New));
        assert!(plan.errors.is_empty());
    }

    #[test]
    fn edit_positions_include_gaps() {
        let mut timeline = Timeline::new("reel_1").with_frame_rate(24.0);
        timeline.push_clip(TimelineClip::new("a", 0, 10).with_shot_name("A"));
        timeline.push_gap(5);
        timeline.push_clip(TimelineClip::new("b", 0, 24).with_shot_name("B"));

        let plan = reconciler(&settings())
            .reconcile(&timeline, &target(), None)
            .unwrap();
        let items = &plan.cut_items;
        assert_eq!((items[0].edit_in, items[0].edit_out), (1, 10));
        assert_eq!((items[1].edit_in, items[1].edit_out), (16, 39));
        assert_eq!(items[1].cut_order, 2);
        assert_eq!(items[1].timecode_edit_in, Timecode::new(0, 0, 0, 15));
        assert_eq!(items[1].timecode_edit_out, Timecode::new(0, 0, 1, 15));
        let cut = plan.cut.as_ref().unwrap();
        assert_eq!(cut.duration, 39);
        assert_eq!(cut.timecode_end, Timecode::new(0, 0, 1, 15));
    }

    #[test]
    fn reconciling_the_result_again_is_empty() {
        let reconciler = reconciler(&settings());
        let mut timeline = timeline(&["A", "B"]);
        timeline.push_clip(
            TimelineClip::new("plate", 0, 12)
                .with_shot_name("C")
                .with_media(
                    MediaReference::new("/media/plate.mov")
                        .with_available_range(FrameRange::new(0, 48)),
                ),
        );

        let first = reconciler.reconcile(&timeline, &target(), None).unwrap();
        assert_eq!(first.versions_to_create.len(), 1);
        let second = reconciler
            .reconcile(&timeline, &target(), Some(first.resulting_snapshot()))
            .unwrap();
        assert!(second.is_empty(), "{:?}", second);
        assert!(second.report.iter().all(|e| e.diff_type == DiffType::NoChange));
    }

    #[test]
    fn replaced_shot_is_omitted_and_new_one_created() {
        let reconciler = reconciler(&settings());
        let first = reconciler
            .reconcile(&timeline(&["A", "B"]), &target(), None)
            .unwrap();
        let mut snapshot = first.resulting_snapshot().clone();
        snapshot.shot_mut("B").unwrap().status = Some("ip".into());

        let plan = reconciler
            .reconcile(&timeline(&["A", "C"]), &target(), Some(&snapshot))
            .unwrap();

        assert_eq!(plan.shots_to_create.len(), 1);
        assert_eq!(plan.shots_to_create[0].name, "C");
        assert_eq!(plan.shot_updates.len(), 1);
        assert_eq!(plan.shot_updates[0].name, "B");
        assert_eq!(
            plan.shot_updates[0].changes.status,
            Some(ShotStatus::new("omt"))
        );
        assert_eq!(
            plan.status_history_updates,
            vec![StatusRecord {
                shot: "B".into(),
                status: "ip".into()
            }]
        );
        assert_eq!(shot(&plan, "A").status, None);

        let types: Vec<DiffType> = plan.report.iter().map(|e| e.diff_type).collect();
        assert_eq!(types, vec![DiffType::NoChange, DiffType::New, DiffType::Omitted]);
    }

    #[test]
    fn omitted_shot_is_reinstated_to_fixed_status() {
        let mut settings = settings();
        settings.shots.shot_reinstate_status = ReinstateStatus::Status("Active".into());
        let reconciler = reconciler(&settings);

        let first = reconciler
            .reconcile(&timeline(&["A", "B"]), &target(), None)
            .unwrap();
        let second = reconciler
            .reconcile(&timeline(&["A"]), &target(), Some(first.resulting_snapshot()))
            .unwrap();
        assert_eq!(shot(&second, "B").status, Some(ShotStatus::new("omt")));

        let third = reconciler
            .reconcile(&timeline(&["A", "B"]), &target(), Some(second.resulting_snapshot()))
            .unwrap();
        assert_eq!(shot(&third, "B").status, Some(ShotStatus::new("Active")));
        assert!(third
            .report
            .iter()
            .any(|e| e.diff_type == DiffType::Reinstated));
    }

    #[test]
    fn omit_then_reinstate_restores_previous_status() {
        let reconciler = reconciler(&settings());
        let first = reconciler
            .reconcile(&timeline(&["A", "B"]), &target(), None)
            .unwrap();
        let mut snapshot = first.resulting_snapshot().clone();
        snapshot.shot_mut("B").unwrap().status = Some("ip".into());

        let omitted = reconciler
            .reconcile(&timeline(&["A"]), &target(), Some(&snapshot))
            .unwrap();
        assert_eq!(shot(&omitted, "B").status, Some(ShotStatus::new("omt")));

        let back = reconciler
            .reconcile(&timeline(&["A", "B"]), &target(), Some(omitted.resulting_snapshot()))
            .unwrap();
        assert_eq!(shot(&back, "B").status, Some(ShotStatus::new("ip")));
        assert!(back.warnings.is_empty());
    }

    #[test]
    fn reinstate_without_history_keeps_status() {
        let reconciler = reconciler(&settings());
        let snapshot = CutSnapshot::shots_only(vec![Shot::new("B").with_status("hld")]);
        let plan = reconciler
            .reconcile(&timeline(&["B"]), &target(), Some(&snapshot))
            .unwrap();

        assert_eq!(shot(&plan, "B").status, Some(ShotStatus::new("hld")));
        assert!(matches!(
            plan.warnings[0],
            ClipWarning::MissingPreviousStatus { .. }
        ));
    }

    #[test]
    fn duplicate_clip_names_get_unique_codes() {
        let mut timeline = Timeline::new("reel_1").with_frame_rate(24.0);
        timeline.push_clip(TimelineClip::new("clip1", 0, 10).with_shot_name("A"));
        timeline.push_clip(TimelineClip::new("clip1", 20, 30).with_shot_name("B"));

        let plan = reconciler(&settings())
            .reconcile(&timeline, &target(), None)
            .unwrap();
        let codes: Vec<&str> = plan.cut_items.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["clip1", "clip1_001"]);
    }

    #[test]
    fn relative_mapping_places_new_shots() {
        let mut settings = settings();
        settings.cut.timecode_in_to_frame_mapping_mode = 2;
        settings.cut.timecode_in_to_frame_relative_mapping.timecode = "00:00:00:01".into();
        settings.cut.timecode_in_to_frame_relative_mapping.frame = 1001;

        let mut timeline = Timeline::new("reel_1").with_frame_rate(24.0);
        timeline.push_clip(TimelineClip::new("a", 11, 21).with_shot_name("A"));

        let plan = reconciler(&settings)
            .reconcile(&timeline, &target(), None)
            .unwrap();
        assert_eq!(plan.shots_to_create[0].cut_in, Some(1011));
        assert_eq!(plan.cut_items[0].cut_item_in, 1011);
    }

    #[test]
    fn trimmed_clip_keeps_the_handle_region() {
        let reconciler = reconciler(&settings());
        let first = reconciler
            .reconcile(&timeline(&["A"]), &target(), None)
            .unwrap();
        let before = shot(&first, "A").clone();

        // Trim the head and tail of the clip
        let mut trimmed = Timeline::new("reel_1").with_frame_rate(24.0);
        trimmed.push_clip(TimelineClip::new("clip_A", 103, 107).with_shot_name("A"));
        let second = reconciler
            .reconcile(&trimmed, &target(), Some(first.resulting_snapshot()))
            .unwrap();
        let after = shot(&second, "A");

        assert_eq!(after.cut_in, Some(1004));
        assert_eq!(after.cut_out, Some(1007));
        assert_eq!(after.head_in, before.head_in);
        assert!(after.head_in_duration >= before.head_in_duration);
        assert!(after.tail_out_duration >= before.tail_out_duration);
        // Tail out stays where it was
        assert_eq!(after.tail_out(), before.tail_out());
        assert_eq!(second.report[0].diff_type, DiffType::CutChange);
    }

    #[test]
    fn unresolvable_clips_are_reported_and_keep_their_duration() {
        let mut timeline = Timeline::new("reel_1").with_frame_rate(24.0);
        timeline.push_clip(TimelineClip::new("unknown", 0, 10));
        timeline.push_clip(TimelineClip::new("b", 0, 10).with_shot_name("B"));

        let plan = reconciler(&settings())
            .reconcile(&timeline, &target(), None)
            .unwrap();
        assert_eq!(plan.errors, vec![ClipError::unresolvable("unknown", 1)]);
        assert_eq!(plan.cut_items.len(), 1);
        assert_eq!(plan.cut_items[0].edit_in, 11);
        assert_eq!(plan.report[0].diff_type, DiffType::NoLink);
    }

    #[test]
    fn unknown_frame_rate_aborts_the_pass() {
        let mut timeline = Timeline::new("reel_1");
        timeline.push_clip(TimelineClip::new("a", 0, 10).with_shot_name("A"));

        let err = reconciler(&settings())
            .reconcile(&timeline, &target(), None)
            .unwrap_err();
        assert_eq!(
            err,
            crate::reconcile::ReconcileError::Configuration(
                ConfigurationError::unknown_frame_rate("a")
            )
        );
    }

    #[test]
    fn unavailable_media_gets_no_version() {
        let mut media = MediaReference::new("/missing.mov");
        media.unavailable_reason = Some("No such file".into());
        let mut timeline = Timeline::new("reel_1").with_frame_rate(24.0);
        timeline.push_clip(TimelineClip::new("a", 0, 10).with_shot_name("A").with_media(media));

        let plan = reconciler(&settings())
            .reconcile(&timeline, &target(), None)
            .unwrap();
        assert!(plan.versions_to_create.is_empty());
        assert!(plan.cut_items[0].version.is_none());
        assert!(matches!(
            plan.warnings[0],
            ClipWarning::MediaUnavailable { index: 1, .. }
        ));
    }

    #[test]
    fn versions_use_templates() {
        let mut settings = settings();
        settings.versions.version_names_template = "{SHOT}_{CUT_ITEM_NAME}_{CLIP_INDEX:03d}".into();
        let target = CutTarget::new("demo").with_link(EntityRef::new("Sequence", "seq_01"));

        let mut timeline = Timeline::new("reel_1").with_frame_rate(24.0);
        timeline.push_clip(
            TimelineClip::new("plate", 0, 10)
                .with_shot_name("A")
                .with_media(MediaReference::new("/media/plate.mov")),
        );

        let plan = reconciler(&settings)
            .reconcile(&timeline, &target, None)
            .unwrap();
        let version = &plan.versions_to_create[0];
        assert_eq!(version.name, "A_plate_001");
        assert_eq!(version.path, "demo/seq_01/20240517/cuts/A_plate_001.mov");
        assert_eq!(version.local_storage, "primary");
        assert_eq!(version.entity_link, EntityRef::shot("A"));
        assert_eq!(
            plan.cut_items[0].version,
            Some(EntityRef::version("A_plate_001"))
        );
    }

    #[test]
    fn tracked_media_is_not_published_again() {
        let mut timeline = Timeline::new("reel_1").with_frame_rate(24.0);
        timeline.push_clip(
            TimelineClip::new("plate", 0, 10).with_shot_name("A").with_media(
                MediaReference::new("/media/plate.mov")
                    .with_version(EntityRef::version("plate_v001").with_id(12)),
            ),
        );

        let plan = reconciler(&settings())
            .reconcile(&timeline, &target(), None)
            .unwrap();
        assert!(plan.versions_to_create.is_empty());
        assert_eq!(
            plan.cut_items[0].version.as_ref().and_then(|v| v.id),
            Some(12)
        );
    }

    #[test]
    fn invalid_template_fails_at_build_time() {
        let mut settings = settings();
        settings.versions.version_names_template = "{CLIP_NAME}_{BOGUS}".into();
        assert!(matches!(
            Reconciler::new(&settings),
            Err(crate::reconcile::ReconcileError::Template(_))
        ));
    }

    #[test]
    fn free_function_matches_reconciler() {
        let plan = reconcile(&timeline(&["A"]), &target(), None, &settings()).unwrap();
        assert_eq!(plan.shots_to_create.len(), 1);
    }
}
