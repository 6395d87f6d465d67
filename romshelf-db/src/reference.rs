//! Bulk reads against a reference database.

use std::collections::{BTreeSet, HashMap};

use rusqlite::{params_from_iter, Connection, Row};

use crate::error::ReferenceError;

/// SQLite's default variable limit is 999; stay comfortably under it.
const IN_CHUNK: usize = 500;

/// One row of the primary `rom` table.
#[derive(Debug, Clone)]
pub struct ReferenceRow {
    pub id: i64,
    pub title: String,
    pub name: String,
    pub source: String,
    pub identity: String,
    pub hack: Option<String>,
    pub version: Option<String>,
    pub year: Option<String>,
}

/// Attribute lists for one rom row, in subtable insertion order.
#[derive(Debug, Clone, Default)]
pub struct RowAttributes {
    pub regions: Vec<String>,
    pub discs: Vec<String>,
    pub formats: Vec<String>,
    pub additional: Vec<String>,
}

fn row_to_reference(row: &Row) -> rusqlite::Result<ReferenceRow> {
    Ok(ReferenceRow {
        id: row.get(0)?,
        title: row.get(1)?,
        name: row.get(2)?,
        source: row.get(3)?,
        identity: row.get(4)?,
        hack: row.get(5)?,
        version: row.get(6)?,
        year: row.get(7)?,
    })
}

/// Fetch all rows whose identity value is in `terms`, in one bulk query
/// per chunk.
pub fn fetch_rows(
    conn: &Connection,
    terms: &BTreeSet<String>,
) -> Result<Vec<ReferenceRow>, ReferenceError> {
    let mut rows = Vec::new();
    let terms: Vec<&String> = terms.iter().collect();
    for chunk in terms.chunks(IN_CHUNK) {
        let placeholders = vec!["?"; chunk.len()].join(",");
        let sql = format!(
            "SELECT id, title, name, source, identity, hack, version, year
             FROM rom WHERE identity IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mapped = stmt.query_map(params_from_iter(chunk.iter()), row_to_reference)?;
        for row in mapped {
            rows.push(row?);
        }
    }
    Ok(rows)
}

/// Fetch the four attribute subtables for the given rom ids, grouped by
/// rom id with per-table ordering preserved.
pub fn fetch_attributes(
    conn: &Connection,
    ids: &[i64],
) -> Result<HashMap<i64, RowAttributes>, ReferenceError> {
    let mut attrs: HashMap<i64, RowAttributes> = HashMap::new();

    for table in ["region", "disc", "format", "additional"] {
        for chunk in ids.chunks(IN_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT rom_id, name FROM {table} WHERE rom_id IN ({placeholders}) ORDER BY rowid"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mapped = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in mapped {
                let (rom_id, name) = row?;
                let entry = attrs.entry(rom_id).or_default();
                match table {
                    "region" => entry.regions.push(name),
                    "disc" => entry.discs.push(name),
                    "format" => entry.formats.push(name),
                    _ => entry.additional.push(name),
                }
            }
        }
    }

    Ok(attrs)
}
