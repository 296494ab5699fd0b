//! In-memory entity store, for tests and offline runs.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use super::{Entity, EntityStore, Fields, Filter, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    last_id: u64,
    entities: BTreeMap<String, Vec<Entity>>,
}

/// Thread-safe store keeping entities in memory.
///
/// Ids are unique across all entity types.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities of a type.
    pub fn count(&self, entity_type: &str) -> usize {
        self.tables
            .lock()
            .entities
            .get(entity_type)
            .map_or(0, Vec::len)
    }

    /// Entity by id.
    pub fn get(&self, entity_type: &str, id: u64) -> Option<Entity> {
        self.tables
            .lock()
            .entities
            .get(entity_type)?
            .iter()
            .find(|entity| entity.id == id)
            .cloned()
    }
}

impl EntityStore for InMemoryStore {
    fn find(&self, entity_type: &str, filters: &[Filter]) -> StoreResult<Vec<Entity>> {
        let tables = self.tables.lock();
        Ok(tables
            .entities
            .get(entity_type)
            .map(|entities| {
                entities
                    .iter()
                    .filter(|entity| filters.iter().all(|filter| filter.matches(entity)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn create(&self, entity_type: &str, mut fields: Fields) -> StoreResult<Entity> {
        fields.remove("id");
        let mut tables = self.tables.lock();
        tables.last_id += 1;
        let entity = Entity {
            entity_type: entity_type.to_string(),
            id: tables.last_id,
            fields,
        };
        tables
            .entities
            .entry(entity_type.to_string())
            .or_default()
            .push(entity.clone());
        tracing::trace!("Created {} {}", entity_type, entity.id);
        Ok(entity)
    }

    fn update(&self, entity_type: &str, id: u64, fields: Fields) -> StoreResult<Entity> {
        let mut tables = self.tables.lock();
        let entity = tables
            .entities
            .get_mut(entity_type)
            .and_then(|entities| entities.iter_mut().find(|entity| entity.id == id))
            .ok_or_else(|| StoreError::not_found(entity_type, id))?;
        for (field, value) in fields {
            if field != "id" {
                entity.fields.insert(field, value);
            }
        }
        tracing::trace!("Updated {} {}", entity_type, id);
        Ok(entity.clone())
    }
}
