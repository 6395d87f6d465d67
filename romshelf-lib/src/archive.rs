//! Archive member listing without extraction.
//!
//! Both supported archive formats store member CRC32s in their metadata,
//! so candidate identity values come straight from the central directory
//! (zip) or archive header (7z). Member data is never decompressed.

use std::fs::File;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("7z error: {0}")]
    SevenZip(#[from] sevenz_rust::Error),
}

/// What kind of container a ROM file is, decided once from its extension
/// and passed through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomFileKind {
    RegularFile,
    ZipArchive,
    SevenZipArchive,
}

impl RomFileKind {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("zip") => RomFileKind::ZipArchive,
            Some(ext) if ext.eq_ignore_ascii_case("7z") => RomFileKind::SevenZipArchive,
            _ => RomFileKind::RegularFile,
        }
    }

    pub fn is_archive(self) -> bool {
        !matches!(self, RomFileKind::RegularFile)
    }
}

/// One archive member with its stored CRC32 (lowercase hex).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub crc32: String,
}

/// List the members of an archive together with their CRC32s.
///
/// Members with a zero/absent CRC are omitted (directory entries and
/// unreadable members). A `RegularFile` yields an empty list, which
/// callers treat as "no valid match candidates", not as a failure.
pub fn list_entries(path: &Path) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    match RomFileKind::from_path(path) {
        RomFileKind::RegularFile => Ok(Vec::new()),
        RomFileKind::ZipArchive => list_zip(path),
        RomFileKind::SevenZipArchive => list_sevenz(path),
    }
}

fn list_zip(path: &Path) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut entries = Vec::new();
    for i in 0..archive.len() {
        // by_index_raw reads metadata only, no decompression
        let member = archive.by_index_raw(i)?;
        if member.is_dir() {
            continue;
        }
        let crc = member.crc32();
        if crc == 0 {
            continue;
        }
        entries.push(ArchiveEntry {
            name: member.name().to_string(),
            crc32: format!("{crc:08x}"),
        });
    }
    Ok(entries)
}

fn list_sevenz(path: &Path) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let reader = sevenz_rust::SevenZReader::open(path, sevenz_rust::Password::empty())?;

    let mut entries = Vec::new();
    for member in &reader.archive().files {
        if member.is_directory() || !member.has_crc {
            continue;
        }
        let crc = member.crc as u32;
        if crc == 0 {
            continue;
        }
        entries.push(ArchiveEntry {
            name: member.name().to_string(),
            crc32: format!("{crc:08x}"),
        });
    }
    Ok(entries)
}
