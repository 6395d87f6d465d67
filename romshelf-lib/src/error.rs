use thiserror::Error;

/// Errors that abort a catalog rebuild outright.
///
/// Most failure modes do not land here: validation rejections are silent,
/// per-file I/O problems are logged and skipped, and a missing reference
/// database only degrades its own partition. What remains is the
/// infrastructure around the rebuild itself.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog store error: {0}")]
    Store(#[from] romshelf_catalog::StoreError),
}

/// Errors from collection rule loading.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON parse error in {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}
