//! Lazy extraction of bundled reference databases.
//!
//! The reference databases ship as zip-compressed resources. On first use
//! the database member is extracted next to the application's cache data;
//! subsequent runs reuse the extracted file. The pipeline never writes to
//! a reference database.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};

use crate::error::ReferenceError;

/// One bundled reference database: the zip resource it ships in and the
/// path its extracted form lives at.
#[derive(Debug, Clone)]
pub struct ReferenceSource {
    resource: PathBuf,
    extracted: PathBuf,
}

impl ReferenceSource {
    pub fn new(resource: impl Into<PathBuf>, extracted: impl Into<PathBuf>) -> Self {
        Self {
            resource: resource.into(),
            extracted: extracted.into(),
        }
    }

    /// The extracted database path, materializing it from the bundled zip
    /// if this is the first use.
    pub fn ensure_extracted(&self) -> Result<&Path, ReferenceError> {
        if self.extracted.is_file() {
            return Ok(&self.extracted);
        }
        if !self.resource.is_file() {
            return Err(ReferenceError::MissingResource(self.resource.clone()));
        }

        let file = fs::File::open(&self.resource)?;
        let mut archive = zip::ZipArchive::new(file)?;

        // The resource holds a single .db member; fall back to the first
        // file member if the extension convention isn't followed.
        let index = (0..archive.len())
            .find(|&i| {
                archive
                    .by_index(i)
                    .map(|f| f.is_file() && f.name().ends_with(".db"))
                    .unwrap_or(false)
            })
            .or_else(|| {
                (0..archive.len())
                    .find(|&i| archive.by_index(i).map(|f| f.is_file()).unwrap_or(false))
            })
            .ok_or_else(|| ReferenceError::EmptyResource(self.resource.clone()))?;

        if let Some(parent) = self.extracted.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.extracted.with_extension("db.tmp");
        {
            let mut member = archive.by_index(index)?;
            let mut out = fs::File::create(&tmp)?;
            io::copy(&mut member, &mut out)?;
        }
        fs::rename(&tmp, &self.extracted)?;
        log::debug!(
            "Extracted reference database {} from {}",
            self.extracted.display(),
            self.resource.display()
        );
        Ok(&self.extracted)
    }

    /// Open the extracted database read-only.
    pub fn open(&self) -> Result<Connection, ReferenceError> {
        let path = self.ensure_extracted()?;
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }
}
