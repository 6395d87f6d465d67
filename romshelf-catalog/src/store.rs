//! JSON persistence for the catalog.
//!
//! The catalog file is the sole state carried between runs: a single JSON
//! object mapping relative ROM paths to entry records. A sidecar
//! `*.meta.json` records when the catalog was generated and how many
//! entries it holds, for display purposes only.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Catalog;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sidecar metadata written next to the catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMeta {
    pub generated: String,
    pub entries: usize,
}

/// Load the persisted catalog.
///
/// A missing file is an empty catalog. An unparseable file is also an
/// empty catalog (logged): the next rebuild simply rescans everything.
/// This function never fails.
pub fn load(path: &Path) -> Catalog {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Catalog::new(),
        Err(e) => {
            log::warn!("Could not read catalog {}: {e}", path.display());
            return Catalog::new();
        }
    };
    match serde_json::from_str(&contents) {
        Ok(catalog) => catalog,
        Err(e) => {
            log::warn!(
                "Catalog {} is not valid JSON ({e}), starting from an empty catalog",
                path.display()
            );
            Catalog::new()
        }
    }
}

/// Persist the catalog atomically (write to a temp file, then rename).
pub fn save(path: &Path, catalog: &Catalog) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(catalog)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &contents)?;
    fs::rename(&tmp, path)?;

    let meta = StoreMeta {
        generated: chrono::Utc::now().to_rfc3339(),
        entries: catalog.len(),
    };
    fs::write(meta_path(path), serde_json::to_string_pretty(&meta)?)?;
    Ok(())
}

/// Load the sidecar metadata, if present and parseable.
pub fn load_meta(path: &Path) -> Option<StoreMeta> {
    let contents = fs::read_to_string(meta_path(path)).ok()?;
    serde_json::from_str(&contents).ok()
}

fn meta_path(path: &Path) -> PathBuf {
    path.with_extension("meta.json")
}

/// Drop entries whose source file no longer exists under the ROM root.
///
/// This is how deletions are detected; there is no explicit deletion
/// tracking.
pub fn retain_existing(catalog: &mut Catalog, rom_root: &Path) {
    catalog.retain(|key, _| {
        let mut path = rom_root.to_path_buf();
        path.extend(key.split('/'));
        path.is_file()
    });
}
