//! Data model types for the ROM catalog.
//!
//! The catalog is a map from relative ROM path (stable across runs,
//! `/`-separated on every platform) to a resolved metadata entry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The full persisted catalog, keyed by relative ROM path.
///
/// A `BTreeMap` keeps serialization order stable so the persisted JSON is
/// human-diffable between runs.
pub type Catalog = BTreeMap<String, CatalogEntry>;

/// How an entry's identity was established, together with the identity value.
///
/// `Crc` does not by itself mean the entry was matched in a reference
/// database: a heuristically parsed file still records its first candidate
/// CRC as a provisional identity so a later reference-database update can
/// re-resolve it. `Heuristic` means no identity value was gathered at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "value", rename_all = "kebab-case")]
pub enum Identity {
    /// Matched or keyed by filename stem (arcade-style systems).
    ArcadeStem(String),
    /// Matched or keyed by CRC32 (lowercase hex).
    Crc(String),
    /// No identity value; metadata comes from filename parsing only.
    Heuristic,
}

impl Identity {
    /// The identity method as its wire string.
    pub fn method(&self) -> &'static str {
        match self {
            Identity::ArcadeStem(_) => "arcade-stem",
            Identity::Crc(_) => "crc",
            Identity::Heuristic => "heuristic",
        }
    }

    /// The identity value, if any. `Heuristic` entries carry none.
    pub fn value(&self) -> Option<&str> {
        match self {
            Identity::ArcadeStem(v) | Identity::Crc(v) => Some(v),
            Identity::Heuristic => None,
        }
    }
}

/// One cataloged ROM file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Raw original filename stem, unmodified.
    pub title: String,
    /// Cleaned display name with all bracketed content stripped.
    pub name: String,
    #[serde(flatten)]
    pub identity: Identity,
    /// Canonical region codes, ordered most-specific first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<String>,
    /// Disc/side/tape designators (e.g., "DISC 1"), upper-cased.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discs: Vec<String>,
    /// Video format designators ("PAL", "NTSC", "SECAM").
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formats: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    /// Free-text tags that matched no known pattern.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<String>,
}

impl CatalogEntry {
    /// A minimal entry with only title/name and an identity.
    pub fn bare(title: impl Into<String>, name: impl Into<String>, identity: Identity) -> Self {
        Self {
            title: title.into(),
            name: name.into(),
            identity,
            regions: Vec::new(),
            discs: Vec::new(),
            formats: Vec::new(),
            hack: None,
            version: None,
            year: None,
            extra: Vec::new(),
        }
    }
}

/// The system directory for a relative catalog key (its first `/` segment).
///
/// Returns `None` for keys with fewer than two segments, which the validator
/// never admits into the catalog.
pub fn system_of(key: &str) -> Option<&str> {
    let (system, rest) = key.split_once('/')?;
    if system.is_empty() || rest.is_empty() {
        return None;
    }
    Some(system)
}

/// The filename stem of a relative catalog key.
pub fn stem_of(key: &str) -> &str {
    let file = key.rsplit('/').next().unwrap_or(key);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    }
}
