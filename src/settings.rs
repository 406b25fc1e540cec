use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tokio::time::Duration;

use crate::sales::SalesSignal;
use crate::storage::{validate_category, StorageLayout};

pub const DATA_ROOT_ENV: &str = "SHELFSENSE_DATA_ROOT";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StationSettings {
    pub category: String,
    pub detection_interval_secs: u64,
    pub report_interval_secs: u64,
    pub face_padding_px: u32,
    pub face_confidence_threshold: f32,
}

impl Default for StationSettings {
    fn default() -> Self {
        Self {
            category: "general".into(),
            detection_interval_secs: 5,
            report_interval_secs: 24 * 60 * 60,
            face_padding_px: 20,
            face_confidence_threshold: 0.7,
        }
    }
}

impl StationSettings {
    pub fn detection_interval(&self) -> Duration {
        Duration::from_secs(self.detection_interval_secs)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }

    pub fn validate(&self) -> Result<()> {
        validate_category(&self.category)?;
        if self.report_interval_secs == 0 {
            bail!("station.report_interval_secs must be greater than zero");
        }
        if !(0.0..=1.0).contains(&self.face_confidence_threshold) {
            bail!(
                "station.face_confidence_threshold must be between 0 and 1, got {}",
                self.face_confidence_threshold
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    pub data_root: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("Reports"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SalesSettings {
    pub signal: SalesSignal,
    pub value_column: String,
}

impl Default for SalesSettings {
    fn default() -> Self {
        Self {
            signal: SalesSignal::Sum,
            value_column: "units_sold".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub station: StationSettings,
    pub storage: StorageSettings,
    pub sales: SalesSettings,
}

impl Settings {
    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.storage.data_root)
    }

    fn apply_env(&mut self) {
        if let Ok(root) = std::env::var(DATA_ROOT_ENV) {
            if !root.trim().is_empty() {
                self.storage.data_root = PathBuf::from(root);
            }
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: Settings,
}

impl SettingsStore {
    /// Reads settings from `path`, falling back to defaults when the file does
    /// not exist. A file that exists but cannot be read or decoded is an error.
    pub fn load(path: PathBuf) -> Result<Self> {
        let mut data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid settings in {}", path.display()))?
        } else {
            Settings::default()
        };
        data.apply_env();
        data.station
            .validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;

        Ok(Self { path, data })
    }

    pub fn settings(&self) -> &Settings {
        &self.data
    }

    pub fn persist(&self) -> Result<()> {
        let serialized = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::load(dir.path().join("none.json")).unwrap();
        let station = &store.settings().station;
        assert_eq!(station.detection_interval(), Duration::from_secs(5));
        assert_eq!(station.report_interval(), Duration::from_secs(86_400));
        assert_eq!(store.settings().sales.value_column, "units_sold");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelfsense.json");
        fs::write(
            &path,
            r#"{
                "station": {"category": "dairy", "report_interval_secs": 3600},
                "sales": {"signal": "count"}
            }"#,
        )
        .unwrap();

        let store = SettingsStore::load(path).unwrap();
        let settings = store.settings();
        assert_eq!(settings.station.category, "dairy");
        assert_eq!(settings.station.report_interval_secs, 3600);
        assert_eq!(settings.station.detection_interval_secs, 5);
        assert_eq!(settings.sales.signal, SalesSignal::Count);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = SettingsStore::load(path).err().unwrap();
        assert!(err.to_string().contains("Invalid settings"));
    }

    #[test]
    fn persisted_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelfsense.json");
        let store = SettingsStore::load(path.clone()).unwrap();
        store.persist().unwrap();

        let reloaded = SettingsStore::load(path).unwrap();
        assert_eq!(reloaded.settings().station, store.settings().station);
        assert_eq!(reloaded.settings().sales, store.settings().sales);
    }

    #[test]
    fn out_of_range_station_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for station in [
            r#"{"report_interval_secs": 0}"#,
            r#"{"face_confidence_threshold": 1.5}"#,
            r#"{"category": "dai\nry"}"#,
        ] {
            let path = dir.path().join("shelfsense.json");
            fs::write(&path, format!(r#"{{"station": {station}}}"#)).unwrap();
            let err = SettingsStore::load(path).err().unwrap();
            assert!(err.to_string().contains("Invalid settings"), "{station}");
        }
    }
}
