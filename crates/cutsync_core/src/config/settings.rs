//! Reconciliation options, one struct per TOML table.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::models::{ReinstateStatus, ShotStatus};
use crate::reconcile::ConfigurationError;
use crate::timecode::TimecodeMapping;

/// Every option a reconciliation pass reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Cut frame and timecode settings.
    #[serde(default)]
    pub cut: CutSettings,

    /// Shot naming and status settings.
    #[serde(default)]
    pub shots: ShotSettings,

    /// Version creation settings.
    #[serde(default)]
    pub versions: VersionSettings,

    /// Default log level.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Check that the settings can drive a reconciliation pass.
    ///
    /// Templates are checked when a reconciler is built from the settings.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.cut.timecode_mapping()?;
        self.shots.shot_regex()?;
        self.shots.validate_fields_prefix()?;
        if self.cut.default_head_in_duration < 0 {
            return Err(ConfigurationError::invalid_setting(
                "default_head_in_duration",
                "must not be negative",
            ));
        }
        if self.cut.default_tail_out_duration < 0 {
            return Err(ConfigurationError::invalid_setting(
                "default_tail_out_duration",
                "must not be negative",
            ));
        }
        if self.versions.local_storage_name.trim().is_empty() {
            return Err(ConfigurationError::invalid_setting(
                "local_storage_name",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

/// Anchor pair for relative timecode mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeMapping {
    /// Source timecode of the anchor.
    #[serde(default = "default_anchor_timecode")]
    pub timecode: String,

    /// Frame the anchor timecode maps to.
    #[serde(default = "default_head_in")]
    pub frame: i64,
}

fn default_anchor_timecode() -> String {
    "00:00:00:00".to_string()
}

impl Default for RelativeMapping {
    fn default() -> Self {
        Self {
            timecode: default_anchor_timecode(),
            frame: default_head_in(),
        }
    }
}

/// Frame bookkeeping defaults for new Shots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutSettings {
    /// First frame of new Shots.
    #[serde(default = "default_head_in")]
    pub default_head_in: i64,

    /// Head handle length of new Shots.
    #[serde(default = "default_handles")]
    pub default_head_in_duration: i64,

    /// Tail handle length of new Shots.
    #[serde(default = "default_handles")]
    pub default_tail_out_duration: i64,

    /// 0 = absolute, 1 = automatic, 2 = relative.
    #[serde(default)]
    pub timecode_in_to_frame_mapping_mode: u8,

    /// Anchor used by the relative mode.
    #[serde(default)]
    pub timecode_in_to_frame_relative_mapping: RelativeMapping,
}

fn default_head_in() -> i64 {
    1001
}

fn default_handles() -> i64 {
    8
}

impl Default for CutSettings {
    fn default() -> Self {
        Self {
            default_head_in: default_head_in(),
            default_head_in_duration: default_handles(),
            default_tail_out_duration: default_handles(),
            timecode_in_to_frame_mapping_mode: 0,
            timecode_in_to_frame_relative_mapping: RelativeMapping::default(),
        }
    }
}

impl CutSettings {
    /// Build the timecode mapping policy.
    pub fn timecode_mapping(&self) -> Result<TimecodeMapping, ConfigurationError> {
        let anchor = &self.timecode_in_to_frame_relative_mapping;
        TimecodeMapping::from_mode(
            self.timecode_in_to_frame_mapping_mode,
            Some((anchor.timecode.as_str(), anchor.frame)),
        )
    }
}

/// Shot naming and lifecycle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotSettings {
    /// Fall back to the clip name when nothing else names the Shot.
    #[serde(default)]
    pub use_clip_names_for_shot_names: bool,

    /// Regular expression extracting Shot names from clip names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_name_shot_regexp: Option<String>,

    /// Store cut values in the smart cut fields.
    #[serde(default)]
    pub use_smart_fields: bool,

    /// Store cut values in `sg_<prefix>_*` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_cut_fields_prefix: Option<String>,

    /// Status given to Shots no longer in the Cut.
    #[serde(default = "default_omit_status")]
    pub shot_omit_status: ShotStatus,

    /// Status given to Shots back in the Cut.
    #[serde(default)]
    pub shot_reinstate_status: ReinstateStatus,

    /// Statuses a Shot must have to be reinstated.
    #[serde(default = "default_reinstate_if")]
    pub reinstate_shot_if_status_is: Vec<ShotStatus>,
}

fn default_omit_status() -> ShotStatus {
    ShotStatus::new("omt")
}

fn default_reinstate_if() -> Vec<ShotStatus> {
    vec![ShotStatus::new("omt"), ShotStatus::new("hld")]
}

impl Default for ShotSettings {
    fn default() -> Self {
        Self {
            use_clip_names_for_shot_names: false,
            clip_name_shot_regexp: None,
            use_smart_fields: false,
            shot_cut_fields_prefix: None,
            shot_omit_status: default_omit_status(),
            shot_reinstate_status: ReinstateStatus::default(),
            reinstate_shot_if_status_is: default_reinstate_if(),
        }
    }
}

impl ShotSettings {
    /// Compile the Shot name regular expression, if one is set.
    pub fn shot_regex(&self) -> Result<Option<Regex>, ConfigurationError> {
        match self.clip_name_shot_regexp.as_deref() {
            None => Ok(None),
            Some(pattern) if pattern.trim().is_empty() => Ok(None),
            Some(pattern) => Regex::new(pattern)
                .map(Some)
                .map_err(|e| ConfigurationError::invalid_regex(pattern, e.to_string())),
        }
    }

    /// Check the prefix can be embedded in field names.
    pub fn validate_fields_prefix(&self) -> Result<(), ConfigurationError> {
        if let Some(prefix) = &self.shot_cut_fields_prefix {
            let valid = !prefix.is_empty()
                && prefix
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(ConfigurationError::InvalidFieldsPrefix(prefix.clone()));
            }
        }
        Ok(())
    }
}

/// Version creation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSettings {
    /// Local storage Version paths are relative to.
    #[serde(default = "default_local_storage")]
    pub local_storage_name: String,

    /// Template for the directory Versions are published to.
    #[serde(default = "default_path_template")]
    pub versions_path_template: String,

    /// Template for Version names.
    #[serde(default = "default_name_template")]
    pub version_names_template: String,

    /// Create Versions for clips without a tracked one.
    #[serde(default = "default_true")]
    pub create_missing_versions: bool,
}

fn default_local_storage() -> String {
    "primary".to_string()
}

fn default_path_template() -> String {
    "{PROJECT}/{LINK}/{YYYY}{MM}{DD}/cuts".to_string()
}

fn default_name_template() -> String {
    "{CLIP_NAME}_{UUID}".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for VersionSettings {
    fn default() -> Self {
        Self {
            local_storage_name: default_local_storage(),
            versions_path_template: default_path_template(),
            version_names_template: default_name_template(),
            create_missing_versions: true,
        }
    }
}

/// `[logging]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when RUST_LOG is not set.
    #[serde(default)]
    pub level: LogLevel,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
        }
    }
}

/// A table of the settings file, for [`ConfigManager::update_section`](super::ConfigManager::update_section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Cut,
    Shots,
    Versions,
    Logging,
}

impl ConfigSection {
    /// All sections, in file order.
    pub const ALL: [ConfigSection; 4] = [
        ConfigSection::Cut,
        ConfigSection::Shots,
        ConfigSection::Versions,
        ConfigSection::Logging,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Cut => "cut",
            ConfigSection::Shots => "shots",
            ConfigSection::Versions => "versions",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the section.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Cut => "Frame and timecode bookkeeping",
            ConfigSection::Shots => "Shot naming and status transitions",
            ConfigSection::Versions => "Version names and publish paths",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}
