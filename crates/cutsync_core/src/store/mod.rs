//! Tracking-system store abstraction.
//!
//! Reconciliation itself never talks to a store: a caller loads a
//! [`CutSnapshot`](crate::models::CutSnapshot) with [`load_snapshot`],
//! reconciles, then persists the resulting plan with [`apply_plan`].
//!
//! # Entity layout
//!
//! Entities are flat JSON objects keyed by field name. References to other
//! entities are stored as `{"type": ..., "id": ..., "name": ...}` objects.
//! Shot cut fields follow a [`ShotFieldsConfig`].

mod apply;
mod fields;
mod memory;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use apply::{apply_plan, load_snapshot};
pub use fields::ShotFieldsConfig;
pub use memory::InMemoryStore;

/// Field payload of an entity.
pub type Fields = serde_json::Map<String, Value>;

/// Entity type names used by the store adapters.
pub mod entity_types {
    pub const SHOT: &str = "Shot";
    pub const VERSION: &str = "Version";
    pub const CUT: &str = "Cut";
    pub const CUT_ITEM: &str = "CutItem";
}

/// A stored entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub id: u64,
    pub fields: Fields,
}

impl Entity {
    /// Value of a field, `None` when missing or null.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|value| !value.is_null())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }
}

/// Condition on an entity field.
///
/// The pseudo field `id` matches the entity id.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    /// Whether an entity satisfies the filter.
    pub fn matches(&self, entity: &Entity) -> bool {
        let field_value = |field: &str| -> Option<Value> {
            if field == "id" {
                Some(Value::from(entity.id))
            } else {
                entity.fields.get(field).cloned()
            }
        };
        match self {
            Filter::Eq(field, expected) => {
                field_value(field).as_ref().unwrap_or(&Value::Null) == expected
            }
            Filter::In(field, values) => field_value(field)
                .map(|value| values.contains(&value))
                .unwrap_or(false),
        }
    }
}

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity_type} {id} not found")]
    NotFound { entity_type: String, id: u64 },

    #[error("Invalid field '{field}' on {entity_type}: {message}")]
    InvalidField {
        entity_type: String,
        field: String,
        message: String,
    },

    #[error("Cannot resolve {entity_type} '{name}'")]
    Unresolved { entity_type: String, name: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity_type: impl Into<String>, id: u64) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id,
        }
    }

    pub fn invalid_field(
        entity_type: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            entity_type: entity_type.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unresolved(entity_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Unresolved {
            entity_type: entity_type.into(),
            name: name.into(),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// CRUD access to a tracking system.
pub trait EntityStore: Send + Sync {
    /// Entities of a type matching all filters, in creation order.
    fn find(&self, entity_type: &str, filters: &[Filter]) -> StoreResult<Vec<Entity>>;

    /// Create an entity and return it with its new id.
    fn create(&self, entity_type: &str, fields: Fields) -> StoreResult<Entity>;

    /// Merge fields into an existing entity.
    fn update(&self, entity_type: &str, id: u64, fields: Fields) -> StoreResult<Entity>;

    /// First entity matching all filters.
    fn find_one(&self, entity_type: &str, filters: &[Filter]) -> StoreResult<Option<Entity>> {
        Ok(self.find(entity_type, filters)?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn entity() -> Entity {
        let mut fields = Fields::new();
        fields.insert("code".into(), json!("SH010"));
        fields.insert("sg_cut_in".into(), json!(1009));
        fields.insert("sg_status".into(), Value::Null);
        Entity {
            entity_type: "Shot".into(),
            id: 7,
            fields,
        }
    }

    #[test]
    fn filters_match_fields_and_id() {
        let entity = entity();
        assert!(Filter::eq("code", "SH010").matches(&entity));
        assert!(Filter::eq("id", 7).matches(&entity));
        assert!(!Filter::eq("code", "SH020").matches(&entity));
        assert!(Filter::In("sg_cut_in".into(), vec![json!(1), json!(1009)]).matches(&entity));
        assert!(!Filter::In("missing".into(), vec![json!(1)]).matches(&entity));
    }

    #[test]
    fn null_fields_read_as_missing() {
        let entity = entity();
        assert_eq!(entity.get_i64("sg_cut_in"), Some(1009));
        assert_eq!(entity.get("sg_status"), None);
        assert!(Filter::Eq("sg_status".into(), Value::Null).matches(&entity));
    }
}
