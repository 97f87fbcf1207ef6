//! Process-wide remembered settings, such as the last stock location used.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::QuickAddError;

/// Location id of the last successful Quick-Add.
pub const LAST_LOCATION_KEY: &str = "quickadd.last_location_id";

pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns [`QuickAddError::Preferences`] if the value cannot be stored.
    fn set(&self, key: &str, value: &str) -> Result<(), QuickAddError>;
}

/// Reads the remembered location id, ignoring values that do not parse.
pub fn remembered_location<P: PreferenceStore + ?Sized>(prefs: &P) -> Option<i64> {
    prefs.get(LAST_LOCATION_KEY)?.trim().parse().ok()
}

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferences {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), QuickAddError> {
        let mut values = self.values.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Preferences kept as a flat JSON object on disk.
///
/// A missing or unreadable file reads as empty. Every `set` rewrites the
/// whole file, creating parent directories as needed.
#[derive(Debug)]
pub struct JsonFilePreferences {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFilePreferences {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable preference file");
            BTreeMap::new()
        })
    }

    fn error(&self, reason: impl ToString) -> QuickAddError {
        QuickAddError::Preferences {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        self.read_all().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), QuickAddError> {
        let _guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut values = self.read_all();
        values.insert(key.to_owned(), value.to_owned());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }
        let body = serde_json::to_string_pretty(&values).map_err(|e| self.error(e))?;
        std::fs::write(&self.path, body).map_err(|e| self.error(e))
    }
}
