use std::path::PathBuf;

use thiserror::Error;

/// Errors from reference-database access.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The bundled resource is not present on disk at all. Callers degrade
    /// the affected partition to heuristic naming instead of aborting.
    #[error("Reference resource not found: {0}")]
    MissingResource(PathBuf),

    /// The bundled resource exists but contains no database file.
    #[error("Reference resource {0} contains no database member")]
    EmptyResource(PathBuf),
}
