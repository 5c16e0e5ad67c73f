use log::warn;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

/// Persisted boolean UI state (one-time popups, dashboard auth) lives
/// behind this interface instead of scattered storage reads.
pub trait FlagStore: Send + Sync {
    /// Unset flags read as false.
    fn flag(&self, key: &str) -> bool;
    fn set_flag(&self, key: &str, value: bool);
}

pub const POPUP_SEEN: &str = "popup_seen";
pub const MONITOR_AUTHED: &str = "monitor_authed";

#[derive(Default)]
pub struct MemoryFlagStore {
    flags: Mutex<HashMap<String, bool>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryFlagStore {
    fn flag(&self, key: &str) -> bool {
        let flags = self.flags.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        flags.get(key).copied().unwrap_or(false)
    }

    fn set_flag(&self, key: &str, value: bool) {
        let mut flags = self.flags.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        flags.insert(key.to_string(), value);
    }
}

/// Flags persisted as one JSON object on disk. Reads fall back to defaults
/// when the file is missing or unreadable; writes rewrite the whole file.
pub struct JsonFileFlagStore {
    path: PathBuf,
}

impl JsonFileFlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> HashMap<String, bool> {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!("Could not read flags from {}: {}", self.path.display(), e);
                HashMap::new()
            }
        }
    }
}

impl FlagStore for JsonFileFlagStore {
    fn flag(&self, key: &str) -> bool {
        self.read_all().get(key).copied().unwrap_or(false)
    }

    fn set_flag(&self, key: &str, value: bool) {
        let mut all = self.read_all();
        all.insert(key.to_string(), value);
        match serde_json::to_string_pretty(&all) {
            Ok(text) => {
                if let Err(e) = fs::write(&self.path, text) {
                    warn!("Could not persist flags to {}: {}", self.path.display(), e);
                }
            }
            Err(e) => warn!("Could not serialize flags: {}", e),
        }
    }
}

/// The one-time marketing popup shows until it has been acknowledged once.
pub fn should_show_popup(flags: &dyn FlagStore) -> bool {
    !flags.flag(POPUP_SEEN)
}

pub fn mark_popup_seen(flags: &dyn FlagStore) {
    flags.set_flag(POPUP_SEEN, true);
}
