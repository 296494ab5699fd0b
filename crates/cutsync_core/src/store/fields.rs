//! Store field names of Shot cut values.
//!
//! Three layouts are supported:
//! - standard `sg_*` fields (`sg_cut_in`, `sg_tail_out`...)
//! - smart cut fields (`cut_in`, `head_out`, `tail_duration`...)
//! - custom `sg_<prefix>_*` fields
//!
//! Smart fields win when both smart fields and a prefix are configured.

use serde_json::Value;

use super::{Entity, Fields, StoreError, StoreResult};
use crate::config::ShotSettings;
use crate::models::{Shot, ShotChanges, ShotStatus};
use crate::reconcile::ConfigurationError;

/// Field holding the Shot name.
pub const SHOT_CODE_FIELD: &str = "code";

/// Field names used to read and write Shot cut values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotFieldsConfig {
    pub status: String,
    pub head_in: String,
    pub cut_in: String,
    pub cut_out: String,
    pub tail_out: String,
    pub cut_duration: String,
    pub cut_order: String,
    pub working_duration: Option<String>,
    pub head_out: Option<String>,
    pub head_duration: Option<String>,
    pub tail_in: Option<String>,
    pub tail_duration: Option<String>,
    /// Status recorded when the Shot was last omitted.
    pub previous_status: String,
}

impl Default for ShotFieldsConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl ShotFieldsConfig {
    /// Standard `sg_*` fields.
    pub fn standard() -> Self {
        Self {
            status: "sg_status".into(),
            head_in: "sg_head_in".into(),
            cut_in: "sg_cut_in".into(),
            cut_out: "sg_cut_out".into(),
            tail_out: "sg_tail_out".into(),
            cut_duration: "sg_cut_duration".into(),
            cut_order: "sg_cut_order".into(),
            working_duration: Some("sg_working_duration".into()),
            head_out: None,
            head_duration: None,
            tail_in: None,
            tail_duration: None,
            previous_status: "sg_previous_status".into(),
        }
    }

    /// Smart cut fields. They have no working duration.
    pub fn smart() -> Self {
        Self {
            head_in: "head_in".into(),
            cut_in: "cut_in".into(),
            cut_out: "cut_out".into(),
            tail_out: "tail_out".into(),
            cut_duration: "cut_duration".into(),
            working_duration: None,
            head_out: Some("head_out".into()),
            head_duration: Some("head_duration".into()),
            tail_in: Some("tail_in".into()),
            tail_duration: Some("tail_duration".into()),
            ..Self::standard()
        }
    }

    /// Custom `sg_<prefix>_*` fields.
    pub fn prefixed(prefix: &str) -> Result<Self, ConfigurationError> {
        if prefix.is_empty()
            || !prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigurationError::InvalidFieldsPrefix(prefix.to_string()));
        }
        let field = |name: &str| format!("sg_{}_{}", prefix, name);
        Ok(Self {
            status: field("status"),
            head_in: field("head_in"),
            cut_in: field("cut_in"),
            cut_out: field("cut_out"),
            tail_out: field("tail_out"),
            cut_duration: field("cut_duration"),
            cut_order: field("cut_order"),
            working_duration: Some(field("working_duration")),
            head_out: None,
            head_duration: None,
            tail_in: None,
            tail_duration: None,
            previous_status: field("previous_status"),
        })
    }

    /// Layout selected by the Shot settings.
    pub fn from_settings(settings: &ShotSettings) -> Result<Self, ConfigurationError> {
        if settings.use_smart_fields {
            return Ok(Self::smart());
        }
        match settings.shot_cut_fields_prefix.as_deref().map(str::trim) {
            Some(prefix) if !prefix.is_empty() => Self::prefixed(prefix),
            _ => Ok(Self::standard()),
        }
    }

    /// Fields to create a Shot with.
    pub fn shot_to_fields(&self, shot: &Shot) -> Fields {
        let mut fields = Fields::new();
        fields.insert(SHOT_CODE_FIELD.into(), Value::from(shot.name.clone()));
        if let Some(status) = &shot.status {
            fields.insert(self.status.clone(), Value::from(status.as_str()));
        }
        self.insert_cut_values(&mut fields, shot);
        fields
    }

    /// Fields to write for a Shot update.
    ///
    /// `after` is the Shot with the changes applied; derived values such as
    /// durations are rewritten whenever a cut value changed.
    pub fn changes_to_fields(&self, changes: &ShotChanges, after: &Shot) -> Fields {
        let mut fields = Fields::new();
        if let Some(status) = &changes.status {
            fields.insert(self.status.clone(), Value::from(status.as_str()));
        }
        let cut_values_changed = ShotChanges {
            status: None,
            ..changes.clone()
        };
        if !cut_values_changed.is_empty() {
            self.insert_cut_values(&mut fields, after);
        }
        fields
    }

    fn insert_cut_values(&self, fields: &mut Fields, shot: &Shot) {
        let mut put = |name: Option<&String>, value: Option<i64>| {
            if let (Some(name), Some(value)) = (name, value) {
                fields.insert(name.clone(), Value::from(value));
            }
        };
        put(Some(&self.head_in), shot.head_in);
        put(Some(&self.cut_in), shot.cut_in);
        put(Some(&self.cut_out), shot.cut_out);
        put(Some(&self.tail_out), shot.tail_out());
        put(Some(&self.cut_duration), shot.cut_duration());
        put(
            Some(&self.cut_order),
            shot.cut_order.map(|order| order as i64),
        );
        put(self.working_duration.as_ref(), shot.working_duration());
        put(self.head_out.as_ref(), shot.head_out());
        put(self.head_duration.as_ref(), shot.head_in_duration);
        put(self.tail_in.as_ref(), shot.tail_in());
        put(self.tail_duration.as_ref(), shot.tail_out_duration);
    }

    /// Read a Shot from a stored entity.
    ///
    /// Without duration fields, the head duration is `cut_in - head_in` and
    /// the tail duration `tail_out - cut_out`.
    pub fn shot_from_entity(&self, entity: &Entity) -> StoreResult<Shot> {
        let name = entity
            .get_str(SHOT_CODE_FIELD)
            .ok_or_else(|| {
                StoreError::invalid_field(&entity.entity_type, SHOT_CODE_FIELD, "missing Shot name")
            })?
            .to_string();

        let int = |field: &str| -> StoreResult<Option<i64>> {
            match entity.get(field) {
                None => Ok(None),
                Some(value) => value.as_i64().map(Some).ok_or_else(|| {
                    StoreError::invalid_field(&entity.entity_type, field, "expected an integer")
                }),
            }
        };
        let opt_int = |field: Option<&String>| -> StoreResult<Option<i64>> {
            match field {
                Some(field) => int(field),
                None => Ok(None),
            }
        };

        let head_in = int(&self.head_in)?;
        let cut_in = int(&self.cut_in)?;
        let cut_out = int(&self.cut_out)?;
        let head_in_duration = match opt_int(self.head_duration.as_ref())? {
            Some(duration) => Some(duration),
            None => match (head_in, cut_in) {
                (Some(head_in), Some(cut_in)) => Some(cut_in - head_in),
                _ => None,
            },
        };
        let tail_out_duration = match opt_int(self.tail_duration.as_ref())? {
            Some(duration) => Some(duration),
            None => match (int(&self.tail_out)?, cut_out) {
                (Some(tail_out), Some(cut_out)) => Some(tail_out - cut_out),
                _ => None,
            },
        };
        let cut_order = int(&self.cut_order)?
            .map(|order| {
                usize::try_from(order).map_err(|_| {
                    StoreError::invalid_field(
                        &entity.entity_type,
                        &self.cut_order,
                        "cut order must not be negative",
                    )
                })
            })
            .transpose()?;

        Ok(Shot {
            id: Some(entity.id),
            name,
            status: entity.get_str(&self.status).map(ShotStatus::new),
            head_in,
            head_in_duration,
            tail_out_duration,
            cut_in,
            cut_out,
            cut_order,
        })
    }

    /// Status recorded before the Shot was omitted, if any.
    pub fn previous_status(&self, entity: &Entity) -> Option<ShotStatus> {
        entity.get_str(&self.previous_status).map(ShotStatus::new)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn shot() -> Shot {
        Shot {
            head_in: Some(1001),
            head_in_duration: Some(8),
            tail_out_duration: Some(8),
            cut_in: Some(1009),
            cut_out: Some(1058),
            cut_order: Some(3),
            ..Shot::new("SH010").with_status("ip")
        }
    }

    fn entity(fields: Fields) -> Entity {
        Entity {
            entity_type: "Shot".into(),
            id: 5,
            fields,
        }
    }

    #[test]
    fn standard_fields() {
        let fields = ShotFieldsConfig::standard().shot_to_fields(&shot());
        assert_eq!(fields["code"], json!("SH010"));
        assert_eq!(fields["sg_status"], json!("ip"));
        assert_eq!(fields["sg_cut_in"], json!(1009));
        assert_eq!(fields["sg_tail_out"], json!(1066));
        assert_eq!(fields["sg_cut_duration"], json!(50));
        assert_eq!(fields["sg_working_duration"], json!(66));
        assert_eq!(fields["sg_cut_order"], json!(3));
        assert!(!fields.contains_key("head_out"));
    }

    #[test]
    fn smart_fields() {
        let fields = ShotFieldsConfig::smart().shot_to_fields(&shot());
        assert_eq!(fields["cut_in"], json!(1009));
        assert_eq!(fields["head_out"], json!(1008));
        assert_eq!(fields["head_duration"], json!(8));
        assert_eq!(fields["tail_in"], json!(1059));
        assert_eq!(fields["tail_duration"], json!(8));
        assert_eq!(fields["sg_cut_order"], json!(3));
        assert!(!fields.contains_key("sg_working_duration"));
    }

    #[test]
    fn prefixed_fields() {
        let config = ShotFieldsConfig::prefixed("alt").unwrap();
        let fields = config.shot_to_fields(&shot());
        assert_eq!(fields["sg_alt_cut_in"], json!(1009));
        assert_eq!(fields["sg_alt_status"], json!("ip"));
        assert_eq!(fields["sg_alt_cut_order"], json!(3));
        assert!(ShotFieldsConfig::prefixed("bad-prefix").is_err());
    }

    #[test]
    fn smart_fields_win_over_prefix() {
        let settings = ShotSettings {
            use_smart_fields: true,
            shot_cut_fields_prefix: Some("alt".into()),
            ..ShotSettings::default()
        };
        assert_eq!(
            ShotFieldsConfig::from_settings(&settings).unwrap(),
            ShotFieldsConfig::smart()
        );
    }

    #[test]
    fn smart_fields_read_back_unchanged() {
        let config = ShotFieldsConfig::smart();
        let read = config
            .shot_from_entity(&entity(config.shot_to_fields(&shot())))
            .unwrap();
        assert_eq!(read, Shot { id: Some(5), ..shot() });
    }

    #[test]
    fn standard_fields_derive_durations() {
        let config = ShotFieldsConfig::standard();
        let read = config
            .shot_from_entity(&entity(config.shot_to_fields(&shot())))
            .unwrap();
        assert_eq!(read, Shot { id: Some(5), ..shot() });

        let prefixed = ShotFieldsConfig::prefixed("alt").unwrap();
        let read = prefixed
            .shot_from_entity(&entity(prefixed.shot_to_fields(&shot())))
            .unwrap();
        assert_eq!(read.head_in_duration, Some(8));
        assert_eq!(read.tail_out_duration, Some(8));
    }

    #[test]
    fn head_duration_needs_head_in_and_cut_in() {
        let mut fields = Fields::new();
        fields.insert("code".into(), json!("SH020"));
        fields.insert("sg_cut_in".into(), json!(1009));
        let read = ShotFieldsConfig::standard()
            .shot_from_entity(&entity(fields))
            .unwrap();
        assert_eq!(read.head_in_duration, None);
        assert_eq!(read.cut_in, Some(1009));
    }

    #[test]
    fn status_only_change_writes_status() {
        let config = ShotFieldsConfig::standard();
        let changes = ShotChanges {
            status: Some("omt".into()),
            ..ShotChanges::default()
        };
        let fields = config.changes_to_fields(&changes, &shot());
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["sg_status"], json!("omt"));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let mut fields = Fields::new();
        fields.insert("code".into(), json!("SH010"));
        fields.insert("sg_cut_in".into(), json!("1009"));
        let err = ShotFieldsConfig::standard()
            .shot_from_entity(&entity(fields))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidField { .. }));
    }
}
