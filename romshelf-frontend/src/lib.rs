//! Device-facing artifact generation.
//!
//! The native launcher does not read the application catalog; it browses
//! per-system SQLite cache tables in its own denormalized format. This
//! crate rebuilds those tables wholesale from the in-memory catalog (or a
//! collection's shortcut set).

pub mod cache_table;

pub use cache_table::{
    build_group, catalog_leaves, rows_for_group, CacheError, CacheLeaf, CacheRow,
    CACHE_DB_SUFFIX, PPATH_JOIN,
};
