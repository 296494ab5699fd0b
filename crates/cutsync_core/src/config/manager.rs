//! Settings file persistence.
//!
//! Files are written through a temp file and a rename. A section update
//! rewrites one table and keeps the rest of the file, comments included, as
//! it is on disk. Loading validates the settings.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item, Table};

use super::settings::{ConfigSection, Settings};
use crate::reconcile::ConfigurationError;

const FILE_HEADER: &str = "# Cut reconciliation settings\n\
# Written by cutsync. Section updates keep hand-made comments.\n";

/// Settings file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Settings file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed settings: {0}")]
    Decode(#[from] toml::de::Error),

    #[error("Cannot encode settings: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Malformed settings document: {0}")]
    Document(#[from] toml_edit::TomlError),

    #[error("Invalid settings: {0}")]
    Invalid(#[from] ConfigurationError),

    #[error("No settings file at {0}")]
    NotFound(PathBuf),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Owns the reconciliation settings and the file they live in.
pub struct ConfigManager {
    file: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Manager for `file`, holding default settings until loaded.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory settings; persisted by `save` or `update_section`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Read and validate the settings file, which must exist.
    pub fn load(&mut self) -> ConfigResult<()> {
        let text = self.read_existing()?;
        self.settings = decode(&text)?;
        tracing::debug!("Loaded settings from {}", self.file.display());
        Ok(())
    }

    /// Read the settings file, writing a default one when it is missing.
    ///
    /// A file with missing keys or unknown sections is rewritten.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        let needs_write = match self.read_existing() {
            Ok(text) => {
                self.settings = decode(&text)?;
                let stale = is_stale(&text, &self.settings)?;
                if stale {
                    tracing::info!("Rewriting {} with missing defaults", self.file.display());
                }
                stale
            }
            Err(ConfigError::NotFound(_)) => {
                tracing::info!("Creating default settings at {}", self.file.display());
                self.settings = Settings::default();
                true
            }
            Err(err) => return Err(err),
        };
        if needs_write {
            self.save()?;
        }
        Ok(())
    }

    /// Write every section.
    pub fn save(&self) -> ConfigResult<()> {
        let mut doc: DocumentMut = toml::to_string_pretty(&self.settings)?.parse()?;
        for section in ConfigSection::ALL {
            if let Some(table) = doc
                .get_mut(section.table_name())
                .and_then(Item::as_table_mut)
            {
                label(table, section, "\n");
            }
        }
        self.replace_file(&format!("{FILE_HEADER}{doc}"))?;
        Ok(())
    }

    /// Write one section from memory into the file on disk.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let mut doc = match self.read_existing() {
            Ok(text) => text.parse::<DocumentMut>()?,
            Err(ConfigError::NotFound(_)) => DocumentMut::new(),
            Err(err) => return Err(err),
        };

        let encoded = match section {
            ConfigSection::Cut => toml::to_string_pretty(&self.settings.cut)?,
            ConfigSection::Shots => toml::to_string_pretty(&self.settings.shots)?,
            ConfigSection::Versions => toml::to_string_pretty(&self.settings.versions)?,
            ConfigSection::Logging => toml::to_string_pretty(&self.settings.logging)?,
        };
        let mut table = encoded.parse::<DocumentMut>()?.as_table().clone();
        label(&mut table, section, "");
        doc[section.table_name()] = Item::Table(table);

        self.replace_file(&doc.to_string())?;
        tracing::debug!(
            "Updated [{}] in {}",
            section.table_name(),
            self.file.display()
        );
        Ok(())
    }

    fn read_existing(&self) -> ConfigResult<String> {
        match fs::read_to_string(&self.file) {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(ConfigError::NotFound(self.file.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Temp file next to the target, then rename over it.
    fn replace_file(&self, content: &str) -> io::Result<()> {
        if let Some(dir) = self.file.parent() {
            fs::create_dir_all(dir)?;
        }
        let staging = self.file.with_extension("toml.tmp");
        let mut out = fs::File::create(&staging)?;
        out.write_all(content.as_bytes())?;
        out.sync_all()?;
        drop(out);
        fs::rename(&staging, &self.file)
    }
}

fn decode(text: &str) -> ConfigResult<Settings> {
    let settings: Settings = toml::from_str(text)?;
    settings.validate()?;
    Ok(settings)
}

/// True when the file lacks keys the settings would write, or carries tables
/// the settings do not know.
fn is_stale(text: &str, settings: &Settings) -> ConfigResult<bool> {
    let on_disk: DocumentMut = text.parse()?;
    let unknown_table = on_disk.iter().any(|(key, _)| {
        ConfigSection::ALL
            .iter()
            .all(|section| section.table_name() != key)
    });
    let expected: DocumentMut = toml::to_string_pretty(settings)?.parse()?;
    Ok(unknown_table || !same_keys(on_disk.as_table(), expected.as_table()))
}

fn label(table: &mut Table, section: ConfigSection, lead: &str) {
    table
        .decor_mut()
        .set_prefix(format!("{lead}# {}\n", section.description()));
}

/// Whether two tables hold the same keys, recursively.
fn same_keys(left: &Table, right: &Table) -> bool {
    left.len() == right.len()
        && left.iter().all(|(key, item)| match (item, right.get(key)) {
            (Item::Table(l), Some(Item::Table(r))) => same_keys(l, r),
            (Item::Table(_), _) | (_, None) => false,
            (_, Some(other)) => !other.is_table(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_or_create_creates_default() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(".config").join("cutsync.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert!(config_path.exists());
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[cut]"));
        assert!(content.contains("[versions]"));
        assert!(content.contains("# Shot naming and status transitions"));

        // Generated file loads back to the same settings
        let mut reloaded = ConfigManager::new(&config_path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.settings(), &Settings::default());
    }

    #[test]
    fn load_or_create_preserves_existing() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("cutsync.toml");

        fs::write(&config_path, "[cut]\ndefault_head_in = 101\n").unwrap();

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert_eq!(manager.settings().cut.default_head_in, 101);
        // Missing defaults were written back
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("default_head_in = 101"));
        assert!(content.contains("local_storage_name"));
    }

    #[test]
    fn load_rejects_invalid_settings() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("cutsync.toml");
        fs::write(&config_path, "[cut]\ntimecode_in_to_frame_mapping_mode = 7\n").unwrap();

        let mut manager = ConfigManager::new(&config_path);
        let err = manager.load().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ConfigurationError::UnknownMappingMode(7))
        ));
    }

    #[test]
    fn unparsable_file_is_a_decode_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("cutsync.toml");
        fs::write(&config_path, "[cut\n").unwrap();

        let mut manager = ConfigManager::new(&config_path);
        assert!(matches!(manager.load(), Err(ConfigError::Decode(_))));
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("missing.toml"));
        assert!(matches!(manager.load(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn update_section_only_changes_target() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("cutsync.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        // Hand edit on disk that must survive the section update
        let content = fs::read_to_string(&config_path).unwrap();
        fs::write(
            &config_path,
            content.replace("default_head_in = 1001", "default_head_in = 2001"),
        )
        .unwrap();

        manager.settings_mut().shots.shot_omit_status = "cut".into();
        manager.update_section(ConfigSection::Shots).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("shot_omit_status = \"cut\""));
        assert!(content.contains("default_head_in = 2001"));

        let mut reloaded = ConfigManager::new(&config_path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.settings().cut.default_head_in, 2001);
        assert_eq!(reloaded.settings().shots.shot_omit_status.as_str(), "cut");
    }

    #[test]
    fn save_leaves_no_staging_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("cutsync.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        let temp_path = config_path.with_extension("toml.tmp");
        assert!(!temp_path.exists());
    }
}
