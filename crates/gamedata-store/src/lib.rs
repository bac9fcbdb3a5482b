//! Persisted flat key/value store for game data.
//!
//! A [`GameData`] store keeps a small document of string entries in memory
//! and writes it to a single file on explicit [`GameData::save`]. Typed
//! accessors convert booleans, integers, floats, strings, timestamps and
//! durations to and from their stored text.
//!
//! # Encodings
//!
//! - [`Encoding::Text`] -- a JSON object (`.json`), optionally obscured with
//!   base64 in release configurations
//! - [`Encoding::Binary`] -- a count-prefixed list of length-prefixed string
//!   pairs (`.bin`)
//!
//! # Session metadata
//!
//! Every store carries three reserved entries: [`CREATED_AT`], set once when
//! the document is first seeded; [`UPDATED_AT`], restamped on every save; and
//! [`TOTAL_PLAY_TIME`], which grows by the time elapsed between saves.
//!
//! # Design Rules
//!
//! 1. Reads never fail: a missing or unparsable entry yields the type's zero
//!    value.
//! 2. Writes never happen implicitly: only `save` touches the disk.
//! 3. I/O and decode errors on load/save/delete are returned, never retried.
//! 4. Obscuring is chosen by configuration, never by sniffing file content.

pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod location;
pub mod obscure;
pub mod store;
pub mod timespan;
pub mod value;

pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::Entries;
pub use config::{Encoding, StoreConfig, DEFAULT_FILE_NAME};
pub use error::{StoreError, StoreResult};
pub use location::SaveLocation;
pub use store::{GameData, CREATED_AT, TOTAL_PLAY_TIME, UPDATED_AT};
pub use value::StoreValue;

// Value types used by the typed accessors.
pub use chrono::{DateTime, TimeDelta, Utc};
