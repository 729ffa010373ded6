// SPDX-License-Identifier: MIT OR Apache-2.0
//! Generator settings.
//!
//! Settings live in a RON file next to the project (`shadergen.ron`) and
//! control where the generated graph is written, how it is encoded and how
//! the layout is spaced. Command-line flags override individual fields.

use serde::{Deserialize, Serialize};
use shadergen_graph::{Encoding, RankLayout};
use std::path::{Path, PathBuf};

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file looked up in the working directory
pub const SETTINGS_FILE_NAME: &str = "shadergen.ron";

/// Default destination of the generated graph
pub const DEFAULT_OUTPUT_PATH: &str = "Assets/Shaders/HDRP/ToonBasic_HDRP.shadergraph";

/// Settings for graph generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Settings format version
    pub version: u32,
    /// Where the generated graph is written
    pub output_path: PathBuf,
    /// Encoding of the generated graph
    pub encoding: Encoding,
    /// Layout spacing
    pub layout: RankLayout,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            encoding: Encoding::Ron,
            layout: RankLayout::default(),
        }
    }
}

impl GeneratorSettings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: GeneratorSettings =
            ron::from_str(&content).map_err(|e| SettingsError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load an explicit settings file, or `shadergen.ron` in `dir` when it
    /// exists, or the defaults
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = dir.join(SETTINGS_FILE_NAME);
        if local.is_file() {
            Self::load(&local)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default();
        let content = ron::ser::to_string_pretty(self, config).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Error while loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File could not be read or written
    #[error("Settings I/O error on {}: {source}", .path.display())]
    Io {
        /// Settings file
        path: PathBuf,
        /// Underlying failure
        source: std::io::Error,
    },

    /// File is not valid settings RON
    #[error("Invalid settings in {}: {message}", .path.display())]
    Parse {
        /// Settings file
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Settings written by a newer version
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = GeneratorSettings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert_eq!(settings.encoding, Encoding::Ron);
        assert_eq!(settings.layout.column_spacing, 200.0);
        assert!(settings.output_path.ends_with("ToonBasic_HDRP.shadergraph"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        let settings = GeneratorSettings {
            encoding: Encoding::Json,
            output_path: PathBuf::from("out/toon.shadergraph"),
            ..GeneratorSettings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(GeneratorSettings::load(&path).unwrap(), settings);
        assert_eq!(GeneratorSettings::resolve(None, dir.path()).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.ron");
        std::fs::write(&path, "(encoding: Json)").unwrap();
        let settings = GeneratorSettings::load(&path).unwrap();
        assert_eq!(settings.encoding, Encoding::Json);
        assert_eq!(settings.layout, RankLayout::default());
    }

    #[test]
    fn test_newer_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.ron");
        std::fs::write(&path, "(version: 9)").unwrap();
        assert!(matches!(
            GeneratorSettings::load(&path),
            Err(SettingsError::UnsupportedVersion { found: 9, .. })
        ));
    }

    #[test]
    fn test_missing_local_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            GeneratorSettings::resolve(None, dir.path()).unwrap(),
            GeneratorSettings::default()
        );
    }
}
