//! The persisted key/value store.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::codec::Entries;
use crate::config::{Encoding, StoreConfig};
use crate::error::StoreResult;
use crate::location::ensure_dir;
use crate::value::StoreValue;

/// Reserved key: when the save was first created.
pub const CREATED_AT: &str = "CreatedAt";
/// Reserved key: when the save was last written.
pub const UPDATED_AT: &str = "UpdatedAt";
/// Reserved key: accumulated time between saves.
pub const TOTAL_PLAY_TIME: &str = "TotalPlayTime";

/// Generates the named getter family for one value type.
macro_rules! typed_getters {
    ($ty:ty, $get:ident, $get_or:ident, $try_get:ident, $what:literal) => {
        #[doc = concat!("Stored ", $what, ", or the zero value when absent or unparsable.")]
        pub fn $get(&self, key: &str) -> $ty {
            self.get(key)
        }

        #[doc = concat!("Stored ", $what, ", or `default` when the value resolves to zero.")]
        ///
        /// A stored zero is treated like a missing key; see [`crate::value`].
        pub fn $get_or(&self, key: &str, default: $ty) -> $ty {
            self.get_or(key, default)
        }

        #[doc = concat!("Stored ", $what, "; `None` only when missing or unparsable.")]
        pub fn $try_get(&self, key: &str) -> Option<$ty> {
            self.try_get(key)
        }
    };
}

/// A flat string key/value document persisted as one file.
///
/// The whole document lives in memory. Setters only touch memory; nothing is
/// written until [`save`](Self::save). Each instance owns its own backing file,
/// so any number of independent stores can coexist in one process.
///
/// Not synchronized: share across threads only behind the embedder's own lock.
pub struct GameData {
    config: StoreConfig,
    directory: PathBuf,
    path: PathBuf,
    entries: Entries,
    clock: Arc<dyn Clock>,
}

impl GameData {
    /// Open the store described by `config` using the system clock.
    ///
    /// Loads the backing file when it exists, otherwise seeds the session
    /// metadata. The file itself is only created by the first save.
    pub fn init(config: StoreConfig) -> StoreResult<Self> {
        Self::init_with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`init`](Self::init) with an explicit time source.
    pub fn init_with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        let mut store = Self {
            config: config.clone(),
            directory: PathBuf::new(),
            path: PathBuf::new(),
            entries: Entries::new(),
            clock,
        };
        store.reinit(config)?;
        Ok(store)
    }

    /// Switch to another backing file and encoding.
    ///
    /// Unsaved changes are discarded, not flushed to the previous file. On
    /// error the store keeps its previous configuration and contents.
    pub fn reinit(&mut self, config: StoreConfig) -> StoreResult<()> {
        config.validate()?;
        let directory = config.location.ensure()?;
        let path = directory.join(config.file_name_with_extension());

        let (entries, loaded) = if file_exists(&path) {
            (read_entries(&path, config.encoding, config.obscure)?, true)
        } else {
            (seeded_entries(self.clock.now()), false)
        };

        info!(
            path = %path.display(),
            encoding = %config.encoding,
            obscure = config.obscure,
            loaded,
            entries = entries.len(),
            "game data initialized"
        );

        self.config = config;
        self.directory = directory;
        self.path = path;
        self.entries = entries;
        Ok(())
    }

    /// Stamp the session metadata and write the whole document to disk,
    /// replacing any previous file.
    ///
    /// `TotalPlayTime` grows by the time since the previous `UpdatedAt`. A clock
    /// that went backwards adds nothing and never moves `UpdatedAt` back.
    pub fn save(&mut self) -> StoreResult<()> {
        let previous = self.try_get::<DateTime<Utc>>(UPDATED_AT);
        let created = self.try_get::<DateTime<Utc>>(CREATED_AT);

        let mut now = self.clock.now();
        if let Some(floor) = previous.into_iter().chain(created).max() {
            now = now.max(floor);
        }

        let elapsed = previous.map_or(TimeDelta::zero(), |prev| now - prev);
        let total = self.total_play_time() + elapsed;

        if created.is_none() {
            self.set(CREATED_AT, now);
        }
        self.set(UPDATED_AT, now);
        self.set(TOTAL_PLAY_TIME, total);

        let data = self
            .config
            .encoding
            .encode(&self.entries, self.config.obscure)?;
        ensure_dir(&self.directory)?;
        fs::write(&self.path, &data)?;

        info!(
            path = %self.path.display(),
            entries = self.entries.len(),
            bytes = data.len(),
            "game data saved"
        );
        Ok(())
    }

    /// Replace the in-memory document with the contents of the backing file.
    pub fn load(&mut self) -> StoreResult<()> {
        self.entries = read_entries(&self.path, self.config.encoding, self.config.obscure)?;
        debug!(path = %self.path.display(), entries = self.entries.len(), "game data loaded");
        Ok(())
    }

    /// Remove the backing file. Returns `true` if a file was removed.
    ///
    /// The in-memory document is left as it is.
    pub fn delete_save(&self) -> StoreResult<bool> {
        remove_if_present(&self.path)
    }

    /// Remove the backing file `config` points at without opening a store.
    ///
    /// Works even when the file is unreadable or corrupt.
    pub fn delete_save_at(config: &StoreConfig) -> StoreResult<bool> {
        config.validate()?;
        remove_if_present(&config.backing_path()?)
    }

    // ---------------------------------------------------------------
    // Typed access
    // ---------------------------------------------------------------

    /// Stored value, or `T::default()` when absent or unparsable.
    pub fn get<T: StoreValue>(&self, key: &str) -> T {
        self.try_get(key).unwrap_or_default()
    }

    /// Stored value, or `default` when the value resolves to `T::default()`.
    ///
    /// This deliberately conflates "never set" with "set to zero"; see
    /// [`crate::value`]. Prefer [`try_get`](Self::try_get) for new code.
    pub fn get_or<T: StoreValue>(&self, key: &str, default: T) -> T {
        let value: T = self.get(key);
        if value.is_zero() {
            default
        } else {
            value
        }
    }

    /// Stored value; `None` only if the key is missing or its text does not
    /// parse as `T`.
    pub fn try_get<T: StoreValue>(&self, key: &str) -> Option<T> {
        self.entries.get(key).and_then(|raw| T::from_stored(raw))
    }

    /// Store a value in memory.
    pub fn set<T: StoreValue>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), value.to_stored());
    }

    typed_getters!(bool, get_bool, get_bool_or, try_get_bool, "boolean");
    typed_getters!(i32, get_int, get_int_or, try_get_int, "integer");
    typed_getters!(f32, get_float, get_float_or, try_get_float, "float");
    typed_getters!(String, get_string, get_string_or, try_get_string, "string");
    typed_getters!(DateTime<Utc>, get_date_time, get_date_time_or, try_get_date_time, "timestamp");
    typed_getters!(TimeDelta, get_time_span, get_time_span_or, try_get_time_span, "duration");

    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.set(key, value)
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i32) {
        self.set(key, value)
    }

    pub fn set_float(&mut self, key: impl Into<String>, value: f32) {
        self.set(key, value)
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn set_date_time(&mut self, key: impl Into<String>, value: DateTime<Utc>) {
        self.set(key, value)
    }

    pub fn set_time_span(&mut self, key: impl Into<String>, value: TimeDelta) {
        self.set(key, value)
    }

    // ---------------------------------------------------------------
    // Session metadata
    // ---------------------------------------------------------------

    pub fn created_at(&self) -> DateTime<Utc> {
        self.get(CREATED_AT)
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.get(UPDATED_AT)
    }

    pub fn total_play_time(&self) -> TimeDelta {
        self.get(TOTAL_PLAY_TIME)
    }

    // ---------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------

    /// Raw stored text for `key`.
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the backing file.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn encoding(&self) -> Encoding {
        self.config.encoding
    }
}

impl std::fmt::Debug for GameData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameData")
            .field("path", &self.path)
            .field("encoding", &self.config.encoding)
            .field("obscure", &self.config.obscure)
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Existence check that never fails: errors count as "absent".
fn file_exists(path: &Path) -> bool {
    match path.try_exists() {
        Ok(exists) => exists,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot check save file; treating as absent");
            false
        }
    }
}

fn remove_if_present(path: &Path) -> StoreResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "game data deleted");
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn read_entries(path: &Path, encoding: Encoding, obscure: bool) -> StoreResult<Entries> {
    let data = fs::read(path)?;
    encoding.decode(&data, obscure)
}

fn seeded_entries(now: DateTime<Utc>) -> Entries {
    let mut entries = Entries::new();
    entries.insert(CREATED_AT.to_string(), now.to_stored());
    entries.insert(UPDATED_AT.to_string(), now.to_stored());
    entries.insert(TOTAL_PLAY_TIME.to_string(), TimeDelta::zero().to_stored());
    entries
}
