//! Filesystem walk over the ROM tree.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Collect every regular file under the ROM root, sorted by path so each
/// rebuild visits files in the same order.
///
/// Hidden directories are pruned during the walk; the validator repeats
/// the check per file, this just avoids descending into them at all.
pub fn scan_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e
                    .file_name()
                    .to_str()
                    .map(|n| n.starts_with('.'))
                    .unwrap_or(false)
        })
        .filter_map(|entry| match entry {
            Ok(e) if e.file_type().is_file() => Some(e.into_path()),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Scan error: {e}");
                None
            }
        })
        .collect()
}

/// The relative, `/`-separated catalog key for a path under the root.
///
/// `None` for paths outside the root or with non-UTF-8 names; such paths
/// are not catalogable anyway.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in rel.components() {
        segments.push(component.as_os_str().to_str()?);
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

/// The absolute path for a catalog key.
pub fn absolute_path(root: &Path, key: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(key.split('/'));
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn scan_is_sorted_and_skips_hidden_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("SFC/b")).unwrap();
        fs::create_dir_all(root.join(".trash")).unwrap();
        fs::write(root.join("SFC/z.sfc"), b"z").unwrap();
        fs::write(root.join("SFC/a.sfc"), b"a").unwrap();
        fs::write(root.join("SFC/b/c.sfc"), b"c").unwrap();
        fs::write(root.join(".trash/x.sfc"), b"x").unwrap();

        let files = scan_files(root);
        let keys: Vec<String> = files
            .iter()
            .filter_map(|p| relative_key(root, p))
            .collect();
        assert_eq!(keys, vec!["SFC/a.sfc", "SFC/b/c.sfc", "SFC/z.sfc"]);
    }

    #[test]
    fn key_round_trips_through_absolute_path() {
        let root = Path::new("/tmp/roms");
        let key = "SFC/sub/game.sfc";
        let abs = absolute_path(root, key);
        assert_eq!(relative_key(root, &abs).as_deref(), Some(key));
    }
}
