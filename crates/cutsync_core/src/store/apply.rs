//! Loading Cut snapshots from a store and persisting mutation plans.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::entity_types::{CUT, CUT_ITEM, SHOT, VERSION};
use super::fields::SHOT_CODE_FIELD;
use super::{Entity, EntityStore, Fields, Filter, ShotFieldsConfig, StoreError, StoreResult};
use crate::models::{
    shot_key, Cut, CutItem, CutSnapshot, CutTarget, EntityRef, MutationPlan, StatusHistory,
};

const PROJECT_FIELD: &str = "project";
const CUT_FIELD: &str = "cut";

fn to_fields<T: Serialize>(entity_type: &str, value: &T) -> StoreResult<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(mut fields) => {
            fields.remove("id");
            Ok(fields)
        }
        _ => Err(StoreError::invalid_field(
            entity_type,
            "",
            "entity does not serialize to an object",
        )),
    }
}

fn from_entity<T: DeserializeOwned>(entity: &Entity) -> StoreResult<T> {
    let mut fields = entity.fields.clone();
    fields.insert("id".into(), Value::from(entity.id));
    Ok(serde_json::from_value(Value::Object(fields))?)
}

fn cut_ref(cut: &Cut, id: u64) -> StoreResult<Value> {
    Ok(serde_json::to_value(
        EntityRef::new(CUT, cut.code.clone()).with_id(id),
    )?)
}

/// Load the latest revision of a Cut and every Shot of its project.
///
/// Returns a snapshot with no Cut when none is recorded under `cut_code`.
pub fn load_snapshot<S: EntityStore + ?Sized>(
    store: &S,
    target: &CutTarget,
    cut_code: &str,
    fields: &ShotFieldsConfig,
) -> StoreResult<CutSnapshot> {
    let shot_entities = store.find(SHOT, &[Filter::eq(PROJECT_FIELD, target.project.as_str())])?;
    let mut shots = Vec::with_capacity(shot_entities.len());
    let mut status_history = StatusHistory::new();
    for entity in &shot_entities {
        let shot = fields.shot_from_entity(entity)?;
        if let Some(status) = fields.previous_status(entity) {
            status_history.record(shot.key(), status);
        }
        shots.push(shot);
    }

    let mut cuts = Vec::new();
    for entity in store.find(
        CUT,
        &[
            Filter::eq(SHOT_CODE_FIELD, cut_code),
            Filter::eq(PROJECT_FIELD, target.project.as_str()),
        ],
    )? {
        cuts.push(from_entity::<Cut>(&entity)?);
    }
    let Some(cut) = cuts.into_iter().max_by_key(|cut| cut.revision_number) else {
        tracing::debug!("No Cut '{}' recorded in '{}'", cut_code, target.project);
        return Ok(CutSnapshot::shots_only(shots).with_status_history(status_history));
    };
    let cut_id = cut
        .id
        .ok_or_else(|| StoreError::unresolved(CUT, cut.code.clone()))?;

    let mut items = Vec::new();
    for entity in store.find(CUT_ITEM, &[Filter::Eq(CUT_FIELD.into(), cut_ref(&cut, cut_id)?)])? {
        items.push(from_entity::<CutItem>(&entity)?);
    }
    items.sort_by_key(|item| item.cut_order);

    tracing::info!(
        "Loaded revision {} of Cut '{}': {} item(s), {} Shot(s)",
        cut.revision_number,
        cut.code,
        items.len(),
        shots.len()
    );
    Ok(CutSnapshot::new(cut, items, shots).with_status_history(status_history))
}

/// Persist a plan: Shots, then Versions, the Cut and its items.
///
/// Returns the resulting snapshot with the ids assigned by the store.
pub fn apply_plan<S: EntityStore + ?Sized>(
    store: &S,
    plan: &MutationPlan,
    fields: &ShotFieldsConfig,
) -> StoreResult<CutSnapshot> {
    let mut snapshot = plan.resulting_snapshot().clone();
    let project = snapshot
        .cut
        .as_ref()
        .map(|cut| cut.project.clone())
        .ok_or_else(|| StoreError::unresolved(CUT, "<none>"))?;

    // Shots
    for shot in &plan.shots_to_create {
        let mut shot_fields = fields.shot_to_fields(shot);
        shot_fields.insert(PROJECT_FIELD.into(), Value::from(project.as_str()));
        let created = store.create(SHOT, shot_fields)?;
        if let Some(resulting) = snapshot.shot_mut(&shot.name) {
            resulting.id = Some(created.id);
        }
    }
    for update in &plan.shot_updates {
        let shot = snapshot
            .shot(&update.name)
            .ok_or_else(|| StoreError::unresolved(SHOT, update.name.clone()))?;
        let id = match update.id.or(shot.id) {
            Some(id) => id,
            None => find_shot_id(store, &project, &update.name)?,
        };
        store.update(SHOT, id, fields.changes_to_fields(&update.changes, shot))?;
    }
    for record in &plan.status_history_updates {
        let id = match snapshot.shot(&record.shot).and_then(|shot| shot.id) {
            Some(id) => id,
            None => find_shot_id(store, &project, &record.shot)?,
        };
        let mut status_fields = Fields::new();
        status_fields.insert(
            fields.previous_status.clone(),
            Value::from(record.status.as_str()),
        );
        store.update(SHOT, id, status_fields)?;
    }
    let shot_ids: HashMap<String, u64> = snapshot
        .shots
        .iter()
        .filter_map(|shot| Some((shot.key(), shot.id?)))
        .collect();
    let resolve_shot = |shot: &EntityRef| -> StoreResult<EntityRef> {
        if shot.id.is_some() {
            return Ok(shot.clone());
        }
        shot_ids
            .get(&shot_key(&shot.name))
            .map(|id| shot.clone().with_id(*id))
            .ok_or_else(|| StoreError::unresolved(SHOT, shot.name.clone()))
    };

    // Versions
    let mut version_ids: HashMap<String, u64> = HashMap::new();
    for version in &plan.versions_to_create {
        let mut version = version.clone();
        version.entity_link = resolve_shot(&version.entity_link)?;
        let created = store.create(VERSION, to_fields(VERSION, &version)?)?;
        version_ids.insert(version.name.clone(), created.id);
    }

    // Cut and items
    let Some(cut) = &plan.cut else {
        tracing::info!("Applied {} mutation(s), Cut unchanged", plan.mutation_count());
        return Ok(snapshot);
    };
    let created = store.create(CUT, to_fields(CUT, cut)?)?;
    let cut_value = cut_ref(cut, created.id)?;

    let mut items = Vec::with_capacity(plan.cut_items.len());
    for item in &plan.cut_items {
        let mut item = item.clone();
        item.shot = resolve_shot(&item.shot)?;
        if let Some(version) = &mut item.version {
            if version.id.is_none() {
                version.id = version_ids.get(&version.name).copied();
            }
        }
        let mut item_fields = to_fields(CUT_ITEM, &item)?;
        item_fields.insert(CUT_FIELD.into(), cut_value.clone());
        item.id = Some(store.create(CUT_ITEM, item_fields)?.id);
        items.push(item);
    }

    snapshot.cut = Some(Cut {
        id: Some(created.id),
        ..cut.clone()
    });
    snapshot.items = items;
    tracing::info!(
        "Applied {} mutation(s), Cut '{}' revision {}",
        plan.mutation_count(),
        cut.code,
        cut.revision_number
    );
    Ok(snapshot)
}

fn find_shot_id<S: EntityStore + ?Sized>(store: &S, project: &str, name: &str) -> StoreResult<u64> {
    store
        .find_one(
            SHOT,
            &[
                Filter::eq(SHOT_CODE_FIELD, name),
                Filter::eq(PROJECT_FIELD, project),
            ],
        )?
        .map(|entity| entity.id)
        .ok_or_else(|| StoreError::unresolved(SHOT, name))
}
