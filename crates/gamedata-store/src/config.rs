//! Store configuration: file name, encoding, obscuring, and save location.
//!
//! A [`StoreConfig`] is fixed when the store is initialized and stays in effect
//! until the store is re-initialized with another one.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::location::SaveLocation;

/// Default logical base name of the save file.
pub const DEFAULT_FILE_NAME: &str = "game_data";

/// Characters that are forbidden anywhere in a save file name.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// On-disk encoding of the save file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    /// A JSON object mapping keys to string values.
    #[default]
    Text,
    /// Count-prefixed sequence of length-prefixed string pairs.
    Binary,
}

impl Encoding {
    /// File extension (with leading dot) for this encoding.
    pub fn extension(&self) -> &'static str {
        match self {
            Encoding::Text => ".json",
            Encoding::Binary => ".bin",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Text => "text",
            Encoding::Binary => "binary",
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "json" => Ok(Encoding::Text),
            "binary" | "bin" => Ok(Encoding::Binary),
            other => Err(format!("unknown encoding: {other}")),
        }
    }
}

/// Configuration for a [`GameData`](crate::GameData) store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Logical base name of the save file (without extension).
    pub file_name: String,
    /// Encoding used for both save and load.
    pub encoding: Encoding,
    /// Run text saves through the reversible base64 transform.
    ///
    /// This is obfuscation for release builds, not encryption.
    pub obscure: bool,
    /// Directory the save file lives in.
    pub location: SaveLocation,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_FILE_NAME.to_string(),
            encoding: Encoding::Text,
            obscure: false,
            location: SaveLocation::default(),
        }
    }
}

impl StoreConfig {
    /// Default configuration with the obscuring transform enabled.
    pub fn release() -> Self {
        Self {
            obscure: true,
            ..Self::default()
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_obscure(mut self, obscure: bool) -> Self {
        self.obscure = obscure;
        self
    }

    pub fn with_location(mut self, location: SaveLocation) -> Self {
        self.location = location;
        self
    }

    /// File name of the backing file: base name plus encoding extension.
    pub fn file_name_with_extension(&self) -> String {
        format!("{}{}", self.file_name, self.encoding.extension())
    }

    /// Full path of the backing file, without creating anything.
    pub fn backing_path(&self) -> StoreResult<PathBuf> {
        Ok(self
            .location
            .resolve()?
            .join(self.file_name_with_extension()))
    }

    /// Check that the configuration can name a file inside the save directory.
    pub fn validate(&self) -> StoreResult<()> {
        validate_file_name(&self.file_name)
    }
}

/// Validate a save file base name.
///
/// The name must stay inside the save directory: it may not be empty, contain
/// path separators or `..`, start with `.`, or contain control characters.
pub fn validate_file_name(name: &str) -> StoreResult<()> {
    let invalid = |reason: &str| StoreError::InvalidFileName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("file name must not be empty"));
    }

    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(StoreError::InvalidFileName {
            name: name.to_string(),
            reason: format!("contains forbidden character: {ch:?}"),
        });
    }

    if name.chars().any(char::is_control) {
        return Err(invalid("contains control characters"));
    }

    if name.contains("..") {
        return Err(invalid("must not contain '..'"));
    }

    if name.starts_with('.') {
        return Err(invalid("must not start with '.'"));
    }

    Ok(())
}
