use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Fixed key under which the portal language preference is persisted.
pub const LANGUAGE_KEY: &str = "userLanguage";

/// Preferences
///
/// The injected persistence capability for small client-visible settings.
/// Deliberately a plain get/set on string keys rather than a settings module:
/// the only current consumer is the language preference, and a failure to
/// persist is logged, never surfaced (last read value stays in effect).
pub trait Preferences: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// The concrete type used to share preference access across the application state.
pub type PrefState = Arc<dyn Preferences>;

/// FilePreferences
///
/// JSON-file-backed preferences: the file is read once at startup and
/// rewritten on every change.
pub struct FilePreferences {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl FilePreferences {
    /// Loads preferences from `path`. A missing or unreadable file starts
    /// empty rather than failing startup.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self {
            path,
            values: RwLock::new(values),
        }
    }
}

impl Preferences for FilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_owned(), value.to_owned());
        match serde_json::to_string_pretty(&*values) {
            Ok(serialized) => {
                if let Err(e) = std::fs::write(&self.path, serialized) {
                    tracing::error!(path = %self.path.display(), error = %e, "failed to persist preferences");
                }
            }
            Err(e) => tracing::error!(error = %e, "failed to serialize preferences"),
        }
    }
}

/// MemoryPreferences
///
/// In-process preferences for tests and ephemeral local runs.
#[derive(Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Preferences for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_owned(), value.to_owned());
    }
}
