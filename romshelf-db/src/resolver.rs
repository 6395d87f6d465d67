//! Batch resolution with duplicate-collision handling.
//!
//! A query batch maps each catalog key to one-or-more candidate identity
//! values (archives can contribute several inner CRCs). At most one
//! candidate per key may resolve, and a reference row may be claimed by at
//! most one key. Violations of either rule are ambiguities: the involved
//! keys are blacklisted and none of the contested resolutions survive.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rusqlite::Connection;

use romshelf_catalog::types::{CatalogEntry, Identity};

use crate::error::ReferenceError;
use crate::reference::{fetch_attributes, fetch_rows, ReferenceRow, RowAttributes};

/// Which identity variant a partition's matches produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    ArcadeStem,
    Crc,
}

impl IdentityKind {
    fn identity(self, value: &str) -> Identity {
        match self {
            IdentityKind::ArcadeStem => Identity::ArcadeStem(value.to_string()),
            IdentityKind::Crc => Identity::Crc(value.to_string()),
        }
    }
}

/// Candidate identity values per catalog key, insertion-ordered per key.
#[derive(Debug, Clone, Default)]
pub struct QueryBatch {
    candidates: BTreeMap<String, Vec<String>>,
}

impl QueryBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate identity value for a key. Duplicate values for the
    /// same key are collapsed (an archive can hold two members with the
    /// same CRC; that is one candidate, not an ambiguity).
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let values = self.candidates.entry(key.into()).or_default();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.candidates.iter()
    }
}

/// The fate of one catalog key after a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Exactly one candidate resolved to an unclaimed reference row.
    Match(CatalogEntry),
    /// The key (or the row it matched) was contested; the caller falls
    /// back to heuristic parsing and must not pick either side.
    Ambiguous,
    /// No candidate matched any reference row.
    Unmatched,
}

#[derive(Debug)]
enum RowClaim {
    Owner(String),
    Contested,
}

/// Resolve a batch against an open reference database.
///
/// Later candidates can retroactively retract an earlier acceptance, so no
/// result is final until the whole batch has been scanned; the per-key and
/// per-row claim maps make that retraction explicit. Blacklisting is
/// scoped to this batch only.
pub fn resolve(
    conn: &Connection,
    batch: &QueryBatch,
    kind: IdentityKind,
) -> Result<BTreeMap<String, ResolutionOutcome>, ReferenceError> {
    if batch.is_empty() {
        return Ok(BTreeMap::new());
    }

    let terms: BTreeSet<String> = batch
        .iter()
        .flat_map(|(_, values)| values.iter().cloned())
        .collect();
    let rows = fetch_rows(conn, &terms)?;
    let by_identity: HashMap<&str, &ReferenceRow> = {
        let mut map = HashMap::with_capacity(rows.len());
        for row in &rows {
            map.entry(row.identity.as_str()).or_insert(row);
        }
        map
    };

    let mut assigned: BTreeMap<String, (i64, String)> = BTreeMap::new();
    let mut claims: HashMap<i64, RowClaim> = HashMap::new();
    let mut blacklist: BTreeSet<String> = BTreeSet::new();

    for (key, values) in batch.iter() {
        for value in values {
            let Some(row) = by_identity.get(value.as_str()) else {
                continue;
            };
            if blacklist.contains(key) {
                continue;
            }
            if let Some((prev_id, prev_value)) = assigned.get(key) {
                if prev_value == value {
                    continue;
                }
                // A second plausible match for the same key: retract the
                // first, free its row, blacklist the key.
                let prev_id = *prev_id;
                assigned.remove(key);
                claims.remove(&prev_id);
                blacklist.insert(key.clone());
                log::debug!("Ambiguous candidates for {key}: {prev_value} vs {value}");
                continue;
            }
            let other_owner = match claims.get(&row.id) {
                None => None,
                Some(RowClaim::Contested) => {
                    blacklist.insert(key.clone());
                    continue;
                }
                Some(RowClaim::Owner(owner)) if owner == key => continue,
                Some(RowClaim::Owner(owner)) => Some(owner.clone()),
            };
            match other_owner {
                Some(owner) => {
                    // Two keys claim the same canonical row. Neither wins,
                    // and the row stays closed for the rest of the batch.
                    assigned.remove(&owner);
                    blacklist.insert(owner.clone());
                    blacklist.insert(key.clone());
                    claims.insert(row.id, RowClaim::Contested);
                    log::debug!("Reference row {} contested by {owner} and {key}", row.id);
                }
                None => {
                    assigned.insert(key.clone(), (row.id, value.clone()));
                    claims.insert(row.id, RowClaim::Owner(key.clone()));
                }
            }
        }
    }

    let ids: Vec<i64> = assigned.values().map(|(id, _)| *id).collect();
    let mut attrs = fetch_attributes(conn, &ids)?;
    let rows_by_id: HashMap<i64, &ReferenceRow> = rows.iter().map(|r| (r.id, r)).collect();

    let mut outcomes = BTreeMap::new();
    for (key, _) in batch.iter() {
        let outcome = if blacklist.contains(key) {
            ResolutionOutcome::Ambiguous
        } else if let Some((id, value)) = assigned.get(key) {
            let row = rows_by_id[id];
            let attributes = attrs.remove(id).unwrap_or_default();
            ResolutionOutcome::Match(entry_from_row(row, attributes, kind.identity(value)))
        } else {
            ResolutionOutcome::Unmatched
        };
        outcomes.insert(key.clone(), outcome);
    }
    Ok(outcomes)
}

fn entry_from_row(row: &ReferenceRow, attrs: RowAttributes, identity: Identity) -> CatalogEntry {
    CatalogEntry {
        title: row.title.clone(),
        name: row.name.clone(),
        identity,
        regions: attrs.regions,
        discs: attrs.discs,
        formats: attrs.formats,
        hack: row.hack.clone(),
        version: row.version.clone(),
        year: row.year.clone(),
        extra: attrs.additional,
    }
}
