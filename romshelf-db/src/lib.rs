//! Reference-database lookup service.
//!
//! Two immutable SQLite databases ship with the application as zip
//! resources: one keyed by filename stem (arcade systems), one keyed by
//! CRC32 (console systems). This crate lazily extracts them, runs bulk
//! identity lookups, and resolves query batches with explicit
//! ambiguity/blacklist handling.

pub mod error;
pub mod reference;
pub mod resolver;
pub mod resource;
pub mod schema;

use std::collections::BTreeMap;

pub use error::ReferenceError;
pub use reference::{ReferenceRow, RowAttributes};
pub use resolver::{IdentityKind, QueryBatch, ResolutionOutcome};
pub use resource::ReferenceSource;
pub use schema::{create_reference_schema, open_memory, open_read_only};

use romshelf_catalog::types::CatalogEntry;

/// A read-only lookup handle over one reference database.
///
/// Explicitly constructed and owned by the orchestrator; there is no
/// process-global database state.
pub struct NameDatabase {
    source: ReferenceSource,
    kind: IdentityKind,
}

impl NameDatabase {
    pub fn new(source: ReferenceSource, kind: IdentityKind) -> Self {
        Self { source, kind }
    }

    /// Resolve a batch of identity candidates to outcomes.
    ///
    /// An empty batch returns an empty map without touching the resource,
    /// so a missing reference database only matters when there is actual
    /// work for it.
    pub fn query(
        &self,
        batch: &QueryBatch,
    ) -> Result<BTreeMap<String, ResolutionOutcome>, ReferenceError> {
        if batch.is_empty() {
            return Ok(BTreeMap::new());
        }
        let conn = self.source.open()?;
        resolver::resolve(&conn, batch, self.kind)
    }

    /// Like [`query`](Self::query) but keeping only successful matches.
    pub fn query_matches(
        &self,
        batch: &QueryBatch,
    ) -> Result<BTreeMap<String, CatalogEntry>, ReferenceError> {
        let outcomes = self.query(batch)?;
        Ok(outcomes
            .into_iter()
            .filter_map(|(key, outcome)| match outcome {
                ResolutionOutcome::Match(entry) => Some((key, entry)),
                ResolutionOutcome::Ambiguous | ResolutionOutcome::Unmatched => None,
            })
            .collect())
    }
}
