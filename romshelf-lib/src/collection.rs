//! Collection rules and shortcut materialization.
//!
//! A collection is a virtual grouping of catalog entries selected by
//! include/exclude regex rules over the cleaned display name. Matched
//! entries are materialized as shortcut files (one per entry, holding the
//! absolute launch path) so the native launcher can browse them like a
//! system folder.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use romshelf_catalog::types::{Catalog, CatalogEntry};

use crate::error::CollectionError;

/// One collection rule as declared in the collections file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRule {
    pub name: String,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Load collection rules from a JSON file (a list of rules).
pub fn load_rules(path: &Path) -> Result<Vec<CollectionRule>, CollectionError> {
    let contents = fs::read_to_string(path).map_err(|source| CollectionError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CollectionError::Parse {
        path: path.display().to_string(),
        source,
    })
}

struct CompiledRule {
    name: String,
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

/// Evaluates collection rules over catalog entries.
pub struct CollectionMatcher {
    rules: Vec<CompiledRule>,
}

impl CollectionMatcher {
    /// Compile rules, dropping invalid patterns with a warning. A rule
    /// whose include list compiles to nothing can never match and is
    /// skipped entirely.
    pub fn new(rules: &[CollectionRule]) -> Self {
        let compiled = rules
            .iter()
            .filter_map(|rule| {
                let include = compile_patterns(&rule.name, &rule.include);
                let exclude = compile_patterns(&rule.name, &rule.exclude);
                if include.is_empty() {
                    log::warn!("Collection '{}' has no usable include patterns", rule.name);
                    return None;
                }
                Some(CompiledRule {
                    name: rule.name.clone(),
                    include,
                    exclude,
                })
            })
            .collect();
        Self { rules: compiled }
    }

    /// Whether an entry belongs to the given compiled rule.
    fn matches(rule: &CompiledRule, entry: &CatalogEntry) -> bool {
        rule.include.iter().any(|re| re.is_match(&entry.name))
            && !rule.exclude.iter().any(|re| re.is_match(&entry.name))
    }

    /// Group catalog entries by collection name. Pure: the catalog is not
    /// touched, and an entry may appear in several collections.
    pub fn collect<'a>(
        &self,
        catalog: &'a Catalog,
    ) -> BTreeMap<String, Vec<(&'a str, &'a CatalogEntry)>> {
        let mut groups: BTreeMap<String, Vec<(&str, &CatalogEntry)>> = BTreeMap::new();
        for rule in &self.rules {
            let members: Vec<(&str, &CatalogEntry)> = catalog
                .iter()
                .filter(|(_, entry)| Self::matches(rule, entry))
                .map(|(key, entry)| (key.as_str(), entry))
                .collect();
            groups.insert(rule.name.clone(), members);
        }
        groups
    }
}

fn compile_patterns(rule_name: &str, patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| {
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(e) => {
                    log::warn!("Collection '{rule_name}': invalid pattern '{pattern}': {e}");
                    None
                }
            }
        })
        .collect()
}

/// One shortcut to write for a collection member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    /// Display name; also the shortcut's filename stem. Must match the
    /// catalog's name formatting so collection cache tables line up with
    /// the main catalog.
    pub name: String,
    /// Absolute launch path of the target ROM.
    pub target: std::path::PathBuf,
}

impl Shortcut {
    /// The on-disk filename this shortcut is written as.
    pub fn file_name(&self) -> String {
        format!("{}.shortcut", sanitize_filename(&self.name))
    }
}

/// Materialize a collection as shortcut files under
/// `<root>/<collection>/`, replacing whatever was there.
pub fn write_shortcuts(
    root: &Path,
    collection: &str,
    shortcuts: &[Shortcut],
) -> io::Result<usize> {
    let dir = root.join(collection);
    if dir.exists() {
        fs::remove_dir_all(&dir)?;
    }
    fs::create_dir_all(&dir)?;

    let mut written = 0;
    for shortcut in shortcuts {
        let file = dir.join(shortcut.file_name());
        fs::write(&file, format!("{}\n", shortcut.target.display()))?;
        written += 1;
    }
    Ok(written)
}

/// Replace path-hostile characters so a display name is a safe filename.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use romshelf_catalog::types::Identity;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        for (key, name) in [
            ("SFC/mario1.sfc", "Super Mario World"),
            ("MD/sonic.md", "Sonic the Hedgehog"),
            ("SFC/kart.sfc", "Super Mario Kart"),
            ("SFC/party.sfc", "Mario Party Demo"),
        ] {
            catalog.insert(
                key.to_string(),
                CatalogEntry::bare(name, name, Identity::Heuristic),
            );
        }
        catalog
    }

    #[test]
    fn include_and_exclude_rules() {
        let rules = vec![CollectionRule {
            name: "Mario".into(),
            include: vec!["mario".into()],
            exclude: vec!["demo".into()],
        }];
        let matcher = CollectionMatcher::new(&rules);
        let groups = matcher.collect(&catalog());

        let members: Vec<&str> = groups["Mario"].iter().map(|(k, _)| *k).collect();
        assert_eq!(members, vec!["SFC/kart.sfc", "SFC/mario1.sfc"]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let rules = vec![CollectionRule {
            name: "Sonic".into(),
            include: vec!["SONIC".into()],
            exclude: vec![],
        }];
        let matcher = CollectionMatcher::new(&rules);
        let groups = matcher.collect(&catalog());
        assert_eq!(groups["Sonic"].len(), 1);
    }

    #[test]
    fn invalid_patterns_are_skipped_not_fatal() {
        let rules = vec![
            CollectionRule {
                name: "Broken".into(),
                include: vec!["(unclosed".into()],
                exclude: vec![],
            },
            CollectionRule {
                name: "Fine".into(),
                include: vec!["sonic".into(), "(also unclosed".into()],
                exclude: vec![],
            },
        ];
        let matcher = CollectionMatcher::new(&rules);
        let groups = matcher.collect(&catalog());
        // "Broken" is dropped; "Fine" keeps its one valid pattern.
        assert!(!groups.contains_key("Broken"));
        assert_eq!(groups["Fine"].len(), 1);
    }

    #[test]
    fn shortcuts_replace_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let shortcuts = vec![Shortcut {
            name: "Sonic the Hedgehog".into(),
            target: "/roms/MD/sonic.md".into(),
        }];
        write_shortcuts(dir.path(), "Favorites", &shortcuts).unwrap();

        let stale = dir.path().join("Favorites/old.shortcut");
        fs::write(&stale, "junk").unwrap();
        write_shortcuts(dir.path(), "Favorites", &shortcuts).unwrap();

        assert!(!stale.exists());
        let content =
            fs::read_to_string(dir.path().join("Favorites/Sonic the Hedgehog.shortcut")).unwrap();
        assert_eq!(content.trim(), "/roms/MD/sonic.md");
    }
}
