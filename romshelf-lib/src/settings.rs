//! Shared application settings.
//!
//! All frontends resolve the same `~/.config/romshelf/settings.toml`, so
//! path configuration stays consistent no matter which entry point runs a
//! rebuild.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Application settings, every field overridable from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the ROM tree (`<rom_root>/<system>/.../<file>`).
    pub rom_root: PathBuf,
    /// Root of the per-system emulator configuration directories.
    pub config_root: PathBuf,
    /// Persisted catalog location.
    pub catalog_path: PathBuf,
    /// Directory holding the bundled reference resources
    /// (`arcade_names.zip`, `console_names.zip`).
    pub resource_dir: PathBuf,
    /// Where the native launcher's cache tables are written.
    pub cache_output: PathBuf,
    /// Collection rule file (JSON).
    pub collections_file: PathBuf,
    /// Where collection shortcut directories are materialized.
    pub collections_root: PathBuf,
    /// Systems identified by filename stem against the arcade reference
    /// database.
    pub arcade_systems: Vec<String>,
    /// Systems whose files keep their raw names and record no identity.
    pub naming_excluded: Vec<String>,
    /// Worker count for concurrent CRC/archive probing.
    pub workers: usize,
    /// Set by upgrades that change catalog semantics; forces one full
    /// rebuild, then clears itself.
    pub rebuild_required: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let data = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            rom_root: PathBuf::from("Roms"),
            config_root: PathBuf::from("Emus"),
            catalog_path: data.join("romshelf").join("catalog.json"),
            resource_dir: PathBuf::from("resources"),
            cache_output: PathBuf::from("Roms"),
            collections_file: PathBuf::from("collections.json"),
            collections_root: PathBuf::from("Collections"),
            arcade_systems: ["MAME", "FBNEO", "ARCADE", "CPS1", "CPS2", "CPS3", "NEOGEO", "PGM"]
                .map(String::from)
                .to_vec(),
            naming_excluded: ["PORTS", "APPS"].map(String::from).to_vec(),
            workers: 4,
            rebuild_required: false,
        }
    }
}

/// Canonical settings file path: `~/.config/romshelf/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("romshelf").join("settings.toml")
}

/// Load settings from the given file, or the canonical location.
///
/// Missing or unparseable settings fall back to defaults; a broken config
/// file must not keep a rebuild from running.
pub fn load(path: Option<&Path>) -> Settings {
    let path = path.map(PathBuf::from).unwrap_or_else(settings_path);
    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => return Settings::default(),
    };
    match toml::from_str(&contents) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Unparseable settings {}: {e}, using defaults", path.display());
            Settings::default()
        }
    }
}

/// Save settings atomically (write to a temp file, then rename).
pub fn save(path: &Path, settings: &Settings) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(settings).map_err(io::Error::other)?;
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, &serialized)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
