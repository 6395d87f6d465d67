//! Path validation for catalogable ROM files.
//!
//! Decides, without side effects, whether a filesystem path is worth
//! cataloging: correct location under the ROM root, not hidden, not an
//! auxiliary file, and carrying an extension the target system accepts.
//! Per-system extension rules come from `<config_root>/<system>/
//! config.json` and are cached after the first load; the cache is owned
//! by this value, not by ambient static state.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Auxiliary file types that are never ROMs: save data, databases,
/// artwork.
const IGNORED_EXTENSIONS: &[&str] = &[
    "srm", "sav", "state", "auto", "rtc", "db", "png", "jpg", "jpeg", "gif", "bmp", "xml",
];

/// Invisible Unicode marks in a filename stem flag files written by broken
/// tooling; such files are skipped entirely.
const IGNORED_STEM_MARKERS: &[char] = &['\u{FEFF}', '\u{200B}', '\u{200E}', '\u{200F}'];

/// A system's accepted extensions. An empty `extlist` in the system
/// config means every extension is valid.
#[derive(Debug, Clone)]
pub enum ExtensionRule {
    Any,
    Allow(HashSet<String>),
}

impl ExtensionRule {
    pub fn allows(&self, extension: Option<&str>) -> bool {
        match self {
            ExtensionRule::Any => true,
            ExtensionRule::Allow(set) => match extension {
                Some(ext) => set.contains(&ext.to_lowercase()),
                None => false,
            },
        }
    }
}

/// Validates candidate ROM paths against the emulator configuration.
pub struct PathValidator {
    rom_root: PathBuf,
    config_root: PathBuf,
    /// system -> rule; `None` records a system with no configuration
    /// directory (nothing under it is catalogable).
    rules: HashMap<String, Option<ExtensionRule>>,
}

impl PathValidator {
    pub fn new(rom_root: impl Into<PathBuf>, config_root: impl Into<PathBuf>) -> Self {
        Self {
            rom_root: rom_root.into(),
            config_root: config_root.into(),
            rules: HashMap::new(),
        }
    }

    /// Whether `path` is a catalogable ROM file.
    ///
    /// Total: returns `false` on any ambiguity (non-UTF-8 names, paths
    /// outside the root, unreadable configs) and never panics. Absent
    /// filesystem changes the answer is stable across calls.
    pub fn is_catalogable(&mut self, path: &Path) -> bool {
        if !path.is_file() {
            return false;
        }
        let Ok(rel) = path.strip_prefix(&self.rom_root) else {
            return false;
        };
        let mut segments: Vec<&str> = Vec::new();
        for component in rel.components() {
            match component.as_os_str().to_str() {
                Some(s) => segments.push(s),
                None => return false,
            }
        }

        // Hidden files or directories anywhere below the root
        if segments.iter().any(|s| s.starts_with('.')) {
            return false;
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        if let Some(ext) = &extension {
            if IGNORED_EXTENSIONS.contains(&ext.as_str()) {
                return false;
            }
        }

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        if stem.chars().any(|c| IGNORED_STEM_MARKERS.contains(&c)) {
            return false;
        }

        // At least <system>/<file>
        if segments.len() < 2 {
            return false;
        }

        let system = segments[0].to_string();
        match self.rule_for(&system) {
            Some(rule) => rule.allows(extension.as_deref()),
            None => false,
        }
    }

    /// Whether an archive member name passes the system's extension rule.
    ///
    /// Used to decide which inner files of an archive are plausible match
    /// candidates.
    pub fn member_allowed(&mut self, system: &str, member_name: &str) -> bool {
        let extension = Path::new(member_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match self.rule_for(system) {
            Some(rule) => rule.allows(extension.as_deref()),
            None => false,
        }
    }

    fn rule_for(&mut self, system: &str) -> Option<&ExtensionRule> {
        if !self.rules.contains_key(system) {
            let rule = self.load_rule(system);
            self.rules.insert(system.to_string(), rule);
        }
        self.rules.get(system).and_then(|r| r.as_ref())
    }

    /// Load `<config_root>/<system>/config.json` and read its pipe-
    /// delimited `extlist`. A missing or unreadable config on an existing
    /// system directory means "all extensions valid".
    fn load_rule(&self, system: &str) -> Option<ExtensionRule> {
        let system_dir = self.config_root.join(system);
        if !system_dir.is_dir() {
            return None;
        }

        let config_path = system_dir.join("config.json");
        let contents = match fs::read_to_string(&config_path) {
            Ok(c) => c,
            Err(_) => return Some(ExtensionRule::Any),
        };
        let doc: serde_json::Value = match serde_json::from_str(&contents) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Unparseable system config {}: {e}", config_path.display());
                return Some(ExtensionRule::Any);
            }
        };

        let extlist = doc.get("extlist").and_then(|v| v.as_str()).unwrap_or("");
        let set: HashSet<String> = extlist
            .split('|')
            .filter(|s| !s.is_empty())
            .map(|s| s.trim().to_lowercase())
            .collect();
        if set.is_empty() {
            Some(ExtensionRule::Any)
        } else {
            Some(ExtensionRule::Allow(set))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, PathValidator) {
        let dir = tempfile::tempdir().unwrap();
        let roms = dir.path().join("Roms");
        let emus = dir.path().join("Emus");
        fs::create_dir_all(roms.join("SFC/sub")).unwrap();
        fs::create_dir_all(roms.join("UNKNOWN")).unwrap();
        fs::create_dir_all(emus.join("SFC")).unwrap();
        fs::create_dir_all(emus.join("GB")).unwrap();
        fs::write(
            emus.join("SFC/config.json"),
            r#"{"extlist": "sfc|smc|zip"}"#,
        )
        .unwrap();
        fs::create_dir_all(roms.join("GB")).unwrap();

        let validator = PathValidator::new(&roms, &emus);
        (dir, validator)
    }

    fn touch(dir: &tempfile::TempDir, rel: &str) -> PathBuf {
        let path = dir.path().join("Roms").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn accepts_configured_extension() {
        let (dir, mut v) = setup();
        let path = touch(&dir, "SFC/Super Game (U).sfc");
        assert!(v.is_catalogable(&path));
        // Stable across calls
        assert!(v.is_catalogable(&path));
    }

    #[test]
    fn accepts_nested_subdirectories() {
        let (dir, mut v) = setup();
        let path = touch(&dir, "SFC/sub/Deep Game.smc");
        assert!(v.is_catalogable(&path));
    }

    #[test]
    fn rejects_unconfigured_extension() {
        let (dir, mut v) = setup();
        let path = touch(&dir, "SFC/readme.nfo");
        assert!(!v.is_catalogable(&path));
    }

    #[test]
    fn rejects_missing_file() {
        let (dir, mut v) = setup();
        assert!(!v.is_catalogable(&dir.path().join("Roms/SFC/nope.sfc")));
    }

    #[test]
    fn rejects_hidden_segments() {
        let (dir, mut v) = setup();
        let hidden_file = touch(&dir, "SFC/.hidden.sfc");
        let hidden_dir = touch(&dir, "SFC/.trash/game.sfc");
        assert!(!v.is_catalogable(&hidden_file));
        assert!(!v.is_catalogable(&hidden_dir));
    }

    #[test]
    fn rejects_ignored_extensions() {
        let (dir, mut v) = setup();
        for rel in ["SFC/save.srm", "SFC/art.png", "SFC/index.db"] {
            let path = touch(&dir, rel);
            assert!(!v.is_catalogable(&path), "{rel}");
        }
    }

    #[test]
    fn rejects_marker_characters_in_stem() {
        let (dir, mut v) = setup();
        let path = touch(&dir, "SFC/bad\u{200B}name.sfc");
        assert!(!v.is_catalogable(&path));
    }

    #[test]
    fn rejects_files_directly_under_root() {
        let (dir, mut v) = setup();
        let path = touch(&dir, "loose.sfc");
        assert!(!v.is_catalogable(&path));
    }

    #[test]
    fn rejects_system_without_config_directory() {
        let (dir, mut v) = setup();
        let path = touch(&dir, "UNKNOWN/game.sfc");
        assert!(!v.is_catalogable(&path));
    }

    #[test]
    fn system_without_config_file_accepts_everything() {
        let (dir, mut v) = setup();
        let path = touch(&dir, "GB/game.anything");
        assert!(v.is_catalogable(&path));
    }

    #[test]
    fn member_rule_follows_system_config() {
        let (_dir, mut v) = setup();
        assert!(v.member_allowed("SFC", "inner/game.sfc"));
        assert!(!v.member_allowed("SFC", "inner/game.txt"));
        assert!(v.member_allowed("GB", "anything.bin"));
        assert!(!v.member_allowed("MISSING", "game.sfc"));
    }
}
