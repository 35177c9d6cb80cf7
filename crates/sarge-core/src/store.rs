//! Save/load adapter for persisted documents.
//!
//! The launcher treats configuration and application data as opaque
//! documents behind the [`Store`] trait. [`JsonFileStore`] is the on-disk
//! implementation: pretty-printed JSON, with a missing or unreadable
//! document replaced by its default.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::config::data_dir;
use crate::error::StoreError;

/// Key-value style persistence of a single document.
pub trait Store<T>: Send + Sync {
    /// Load the document, falling back to its default when absent.
    fn load(&self) -> Result<T, StoreError>;

    /// Persist the document.
    fn save(&self, value: &T) -> Result<(), StoreError>;
}

/// A document stored as a JSON file.
pub struct JsonFileStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    /// A store for `file_name` inside the launcher's data directory.
    pub fn in_data_dir(file_name: &str) -> Result<Self, StoreError> {
        let dir = data_dir().ok_or(StoreError::NoDataDir)?;
        Ok(Self::new(dir.join(file_name)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl<T> JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    fn write_default(&self) -> Result<T, StoreError> {
        let value = T::default();
        self.save(&value)?;
        Ok(value)
    }
}

impl<T> Store<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    fn load(&self) -> Result<T, StoreError> {
        if !self.path.exists() {
            tracing::info!("No document at {:?}, writing defaults", self.path);
            return self.write_default();
        }

        let text = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!("Corrupt document at {:?} ({}), resetting", self.path, e);
                std::fs::remove_file(&self.path).map_err(|e| self.io_error(e))?;
                self.write_default()
            }
        }
    }

    fn save(&self, value: &T) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let text = serde_json::to_string_pretty(value)?;
        std::fs::write(&self.path, text).map_err(|e| self.io_error(e))?;
        tracing::debug!("Saved document to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppData, AppDataList, Config};

    #[test]
    fn test_load_missing_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::<Config>::new(dir.path().join("config.json"));

        let config = store.load().unwrap();
        assert_eq!(config, Config::default());
        assert!(store.path().exists());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::<AppData>::new(dir.path().join("nested/appdata.json"));

        let mut data = AppData::default();
        data.add(AppDataList::Pinned, "10.0.0.1:27960");
        data.server_password = "hunter2".to_string();
        store.save(&data).unwrap();

        assert_eq!(store.load().unwrap(), data);
    }

    #[test]
    fn test_in_data_dir() {
        match JsonFileStore::<AppData>::in_data_dir("appdata.json") {
            Ok(store) => {
                assert!(store.path().ends_with("sarge/appdata.json"));
                assert_eq!(Some(store.path().to_path_buf()), data_dir().map(|d| d.join("appdata.json")));
            }
            Err(e) => {
                assert!(matches!(e, StoreError::NoDataDir));
                assert!(data_dir().is_none());
            }
        }
    }

    #[test]
    fn test_corrupt_file_is_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appdata.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::<AppData>::new(&path);
        let data = store.load().unwrap();
        assert_eq!(data, AppData::default());

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(serde_json::from_str::<AppData>(&on_disk).is_ok());
    }
}
