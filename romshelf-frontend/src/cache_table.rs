//! Cache-table synthesis for the native launcher.
//!
//! One SQLite file per parent grouping (a system directory or a
//! collection), fully replaced on every build. Each table holds one row
//! per leaf entry plus one synthesized row per unique ancestor directory
//! inside the grouping. Row shape and the arcade trailing-space rule must
//! match the launcher's index format exactly.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use thiserror::Error;

use romshelf_catalog::types::{system_of, Catalog};

/// Filename suffix of every cache database: `<parent>_cache6.db`.
pub const CACHE_DB_SUFFIX: &str = "_cache6";

/// Hierarchy separator in `ppath` and directory display names. Distinct
/// from the OS path separator on every supported platform.
pub const PPATH_JOIN: char = '*';

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// One leaf (ROM or shortcut) to place in a cache table.
#[derive(Debug, Clone)]
pub struct CacheLeaf {
    /// Path below the grouping root, `/`-separated.
    pub rel_path: String,
    /// Display name as resolved by the catalog.
    pub display: String,
    /// Absolute path the launcher executes.
    pub launch_path: PathBuf,
    /// Absolute artwork path.
    pub image_path: PathBuf,
    /// Whether the entry comes from an arcade system. Follows the entry
    /// even into collection tables.
    pub arcade: bool,
}

/// One row of a cache table, in the launcher's column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRow {
    pub disp: String,
    pub path: String,
    pub imgpath: String,
    /// 0 = leaf, 1 = synthesized directory.
    pub row_type: i64,
    pub ppath: String,
    /// The launcher's three sort-key columns all carry this value for
    /// leaf rows and stay empty for directory rows.
    pub sort_key: String,
}

/// Synthesize the full row set for one grouping, deterministically.
///
/// Directory rows come first (in path order), then leaf rows (in path
/// order), so identical input always produces identical tables.
///
/// Directory display names join the segments below the grouping root with
/// [`PPATH_JOIN`]; when the same segment name appears again at any depth,
/// its k-th occurrence is prefixed with k-1 underscores so the launcher
/// can tell the entries apart.
///
/// Arcade-system entries get a single trailing space appended to their
/// display name. The launcher's sort/render path depends on that exact
/// byte, so it is preserved verbatim.
pub fn rows_for_group(group_root: &Path, leaves: &[CacheLeaf]) -> Vec<CacheRow> {
    let mut sorted: Vec<&CacheLeaf> = leaves.iter().collect();
    sorted.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

    // chain of raw segments -> disambiguated display of that directory
    let mut chain_display: HashMap<Vec<String>, String> = HashMap::new();
    let mut occurrences: HashMap<String, usize> = HashMap::new();
    let mut dir_rows: Vec<CacheRow> = Vec::new();

    for leaf in &sorted {
        let segments: Vec<&str> = leaf.rel_path.split('/').collect();
        // Ancestors strictly inside the grouping; depth zero (the root
        // itself) is never materialized.
        for depth in 1..segments.len() {
            let chain: Vec<String> = segments[..depth].iter().map(|s| s.to_string()).collect();
            if chain_display.contains_key(&chain) {
                continue;
            }
            let raw_name = &chain[depth - 1];
            let occ = occurrences.entry(raw_name.clone()).or_insert(0);
            let disamb = format!("{}{raw_name}", "_".repeat(*occ));
            *occ += 1;

            let parent_disp = if depth == 1 {
                String::new()
            } else {
                chain_display[&chain[..depth - 1].to_vec()].clone()
            };
            let disp = if parent_disp.is_empty() {
                disamb
            } else {
                format!("{parent_disp}{PPATH_JOIN}{disamb}")
            };

            let mut dir_path = group_root.to_path_buf();
            dir_path.extend(chain.iter());
            dir_rows.push(CacheRow {
                disp: disp.clone(),
                path: dir_path.display().to_string(),
                imgpath: String::new(),
                row_type: 1,
                ppath: parent_disp,
                sort_key: String::new(),
            });
            chain_display.insert(chain, disp);
        }
    }

    let mut rows = dir_rows;
    for leaf in &sorted {
        let segments: Vec<&str> = leaf.rel_path.split('/').collect();
        let parent_chain: Vec<String> = segments[..segments.len() - 1]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let ppath = if parent_chain.is_empty() {
            String::new()
        } else {
            chain_display[&parent_chain].clone()
        };

        let disp = if leaf.arcade {
            format!("{} ", leaf.display)
        } else {
            leaf.display.clone()
        };
        rows.push(CacheRow {
            sort_key: disp.clone(),
            disp,
            path: leaf.launch_path.display().to_string(),
            imgpath: leaf.image_path.display().to_string(),
            row_type: 0,
            ppath,
        });
    }
    rows
}

/// SQL identifier for a parent grouping's table: `<parent>_roms` with
/// anything outside `[A-Za-z0-9_]` folded to `_`.
fn table_name(parent: &str) -> String {
    let safe: String = parent
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("{safe}_roms")
}

/// Build (or fully replace) the cache table for one parent grouping.
///
/// The table is dropped, recreated and bulk-inserted in a single
/// transaction, so the launcher never observes a half-written table.
pub fn build_group(
    output_root: &Path,
    parent: &str,
    group_root: &Path,
    leaves: &[CacheLeaf],
) -> Result<usize, CacheError> {
    std::fs::create_dir_all(output_root)?;
    let db_path = output_root.join(format!("{parent}{CACHE_DB_SUFFIX}.db"));
    let table = table_name(parent);
    let rows = rows_for_group(group_root, leaves);

    let mut conn = Connection::open(&db_path)?;
    let tx = conn.transaction()?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table};
         CREATE TABLE {table} (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             disp TEXT NOT NULL,
             path TEXT NOT NULL,
             imgpath TEXT NOT NULL,
             type INTEGER NOT NULL,
             ppath TEXT NOT NULL,
             pinyin TEXT NOT NULL,
             cpinyin TEXT NOT NULL,
             opinyin TEXT NOT NULL
         );"
    ))?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {table} (disp, path, imgpath, type, ppath, pinyin, cpinyin, opinyin)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        ))?;
        for row in &rows {
            stmt.execute(params![
                row.disp,
                row.path,
                row.imgpath,
                row.row_type,
                row.ppath,
                row.sort_key,
                row.sort_key,
                row.sort_key,
            ])?;
        }
    }
    tx.commit()?;
    log::debug!("Cache table for {parent}: {} rows", rows.len());
    Ok(rows.len())
}

/// Group catalog entries by system and derive launcher paths.
///
/// Launch paths point at the ROM file itself; artwork is expected at
/// `<system>/Imgs/<subpath>/<stem>.png`, mirroring the ROM layout.
/// `is_arcade` classifies systems so their entries keep the trailing
/// space wherever they end up.
pub fn catalog_leaves(
    catalog: &Catalog,
    rom_root: &Path,
    is_arcade: impl Fn(&str) -> bool,
) -> BTreeMap<String, Vec<CacheLeaf>> {
    let mut groups: BTreeMap<String, Vec<CacheLeaf>> = BTreeMap::new();
    for (key, entry) in catalog {
        let Some(system) = system_of(key) else {
            continue;
        };
        let rel_path = &key[system.len() + 1..];

        let mut launch_path = rom_root.to_path_buf();
        launch_path.extend(key.split('/'));

        let mut image_path = rom_root.join(system).join("Imgs");
        image_path.extend(Path::new(rel_path).iter());
        image_path.set_extension("png");

        let display = if entry.name.is_empty() {
            entry.title.clone()
        } else {
            entry.name.clone()
        };

        let arcade = is_arcade(system);
        groups.entry(system.to_string()).or_default().push(CacheLeaf {
            rel_path: rel_path.to_string(),
            display,
            launch_path,
            image_path,
            arcade,
        });
    }
    groups
}
