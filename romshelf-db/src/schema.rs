//! Reference-database schema.
//!
//! The shipped databases are pre-built; this pipeline only reads them.
//! The DDL lives here for the import tooling that produces them and for
//! test fixtures.

use rusqlite::{Connection, OpenFlags};

use crate::error::ReferenceError;

/// Create the reference schema on an empty database. Idempotent.
pub fn create_reference_schema(conn: &Connection) -> Result<(), ReferenceError> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Open a reference database read-only.
pub fn open_read_only(path: &std::path::Path) -> Result<Connection, ReferenceError> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok(conn)
}

/// Open an in-memory database with the full reference schema. Useful for
/// testing.
pub fn open_memory() -> Result<Connection, ReferenceError> {
    let conn = Connection::open_in_memory()?;
    create_reference_schema(&conn)?;
    Ok(conn)
}

const SCHEMA_SQL: &str = r#"
-- Canonical ROM metadata, one row per known dump
CREATE TABLE IF NOT EXISTS rom (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    name TEXT NOT NULL,
    source TEXT NOT NULL DEFAULT '',
    identity TEXT NOT NULL,
    hack TEXT,
    version TEXT,
    year TEXT
);
CREATE INDEX IF NOT EXISTS idx_rom_identity ON rom(identity);

-- Per-attribute subtables; multiple rows per rom_id, rowid order is
-- the attribute order
CREATE TABLE IF NOT EXISTS region (
    rom_id INTEGER NOT NULL REFERENCES rom(id),
    name TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_region_rom ON region(rom_id);

CREATE TABLE IF NOT EXISTS disc (
    rom_id INTEGER NOT NULL REFERENCES rom(id),
    name TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_disc_rom ON disc(rom_id);

CREATE TABLE IF NOT EXISTS format (
    rom_id INTEGER NOT NULL REFERENCES rom(id),
    name TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_format_rom ON format(rom_id);

CREATE TABLE IF NOT EXISTS additional (
    rom_id INTEGER NOT NULL REFERENCES rom(id),
    name TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_additional_rom ON additional(rom_id);
"#;
