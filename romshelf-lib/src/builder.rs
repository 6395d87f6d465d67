//! Catalog rebuild orchestration.
//!
//! A rebuild moves through `Idle -> Scanning -> Resolving -> Merging ->
//! Persisted`. Scanning walks the ROM tree and decides which files can be
//! retained from the previous catalog; Resolving probes the rest (CRC or
//! archive listing, concurrently) and runs the reference-database
//! lookups; Merging fills every remaining hole with heuristic parses; the
//! result is persisted as the next catalog.
//!
//! A rebuild always completes: per-file failures are logged and skipped,
//! and a missing reference database only degrades its own partition.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use romshelf_catalog::name_parser::{NameParser, NamingMode};
use romshelf_catalog::store;
use romshelf_catalog::types::{stem_of, system_of, Catalog, CatalogEntry, Identity};
use romshelf_db::{IdentityKind, NameDatabase, QueryBatch, ReferenceSource, ResolutionOutcome};

use crate::archive::{self, ArchiveEntry, RomFileKind};
use crate::error::BuildError;
use crate::hasher;
use crate::scanner;
use crate::settings::Settings;
use crate::validator::PathValidator;
use crate::worker_pool::WorkerPool;

/// Filenames of the bundled reference resources under the resource
/// directory.
pub const ARCADE_RESOURCE: &str = "arcade_names.zip";
pub const CONSOLE_RESOURCE: &str = "console_names.zip";

/// Rebuild state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Idle,
    Scanning,
    Resolving,
    Merging,
    Persisted,
}

/// Counters for one rebuild run.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildStats {
    /// Files visited by the walk.
    pub scanned: usize,
    /// Files the validator admitted.
    pub valid: usize,
    /// Entries carried over unchanged from the previous catalog.
    pub retained: usize,
    /// Entries resolved from a reference database this run.
    pub db_matched: usize,
    /// Entries that fell back to heuristic parsing.
    pub heuristic: usize,
    /// Keys blacklisted for ambiguous reference matches (subset of
    /// `heuristic`).
    pub ambiguous: usize,
    /// Files skipped for I/O failures; retried on the next rebuild.
    pub failed: usize,
}

/// One file queued for concurrent identity probing.
struct Probe {
    key: String,
    path: PathBuf,
    kind: RomFileKind,
    /// For an archive already in the catalog: the stored CRC to verify
    /// against the fresh member listing.
    verify: Option<String>,
}

struct ProbeOutcome {
    key: String,
    kind: RomFileKind,
    verify: Option<String>,
    candidates: Vec<ArchiveEntry>,
    error: Option<String>,
}

fn probe_file(probe: Probe) -> ProbeOutcome {
    let result = match probe.kind {
        RomFileKind::RegularFile => hasher::compute_crc32(&probe.path)
            .map(|crc32| {
                vec![ArchiveEntry {
                    name: probe
                        .path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or_default()
                        .to_string(),
                    crc32,
                }]
            })
            .map_err(|e| e.to_string()),
        RomFileKind::ZipArchive | RomFileKind::SevenZipArchive => {
            archive::list_entries(&probe.path).map_err(|e| e.to_string())
        }
    };
    match result {
        Ok(candidates) => ProbeOutcome {
            key: probe.key,
            kind: probe.kind,
            verify: probe.verify,
            candidates,
            error: None,
        },
        Err(error) => ProbeOutcome {
            key: probe.key,
            kind: probe.kind,
            verify: probe.verify,
            candidates: Vec::new(),
            error: Some(error),
        },
    }
}

/// Owns the full rebuild pipeline and the in-memory catalog.
///
/// All collaborating services (validator cache, reference-database
/// handles, parser) are constructed here and passed by reference; nothing
/// in the pipeline reaches for ambient state. Other components read the
/// catalog through [`catalog()`](Self::catalog) and never mutate it.
pub struct CatalogBuilder {
    rom_root: PathBuf,
    catalog_path: PathBuf,
    validator: PathValidator,
    parser: NameParser,
    arcade_db: NameDatabase,
    console_db: NameDatabase,
    arcade_systems: HashSet<String>,
    naming_excluded: HashSet<String>,
    workers: usize,
    rebuild_required: bool,
    phase: BuildPhase,
    catalog: Catalog,
}

impl CatalogBuilder {
    /// Wire a builder from settings, with reference databases extracted
    /// into the user cache directory.
    pub fn new(settings: &Settings) -> Self {
        let cache = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("romshelf");
        let arcade_db = NameDatabase::new(
            ReferenceSource::new(
                settings.resource_dir.join(ARCADE_RESOURCE),
                cache.join("arcade_names.db"),
            ),
            IdentityKind::ArcadeStem,
        );
        let console_db = NameDatabase::new(
            ReferenceSource::new(
                settings.resource_dir.join(CONSOLE_RESOURCE),
                cache.join("console_names.db"),
            ),
            IdentityKind::Crc,
        );
        Self::with_databases(settings, arcade_db, console_db)
    }

    /// Wire a builder with explicit database handles (dependency
    /// injection seam, also used by tests).
    pub fn with_databases(
        settings: &Settings,
        arcade_db: NameDatabase,
        console_db: NameDatabase,
    ) -> Self {
        Self {
            rom_root: settings.rom_root.clone(),
            catalog_path: settings.catalog_path.clone(),
            validator: PathValidator::new(&settings.rom_root, &settings.config_root),
            parser: NameParser::new(),
            arcade_db,
            console_db,
            arcade_systems: settings.arcade_systems.iter().cloned().collect(),
            naming_excluded: settings.naming_excluded.iter().cloned().collect(),
            workers: settings.workers,
            rebuild_required: settings.rebuild_required,
            phase: BuildPhase::Idle,
            catalog: Catalog::new(),
        }
    }

    /// The current in-memory catalog. Read-only accessor for the cache
    /// builder, collections and UI refresh paths.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    /// Whether a system's entries are matched by filename stem.
    pub fn is_arcade_system(&self, system: &str) -> bool {
        self.arcade_systems.contains(system)
    }

    /// Run a full or incremental rebuild.
    ///
    /// Always completes with a usable catalog; the error cases are
    /// limited to persisting the result.
    pub async fn rebuild(&mut self, reset: bool) -> Result<BuildStats, BuildError> {
        let mut stats = BuildStats::default();
        let full = reset || self.rebuild_required;
        self.rebuild_required = false;

        // ── Scanning ────────────────────────────────────────────────────
        self.phase = BuildPhase::Scanning;
        log::info!(
            "Scanning {} ({} rebuild)",
            self.rom_root.display(),
            if full { "full" } else { "incremental" }
        );

        let mut previous = if full {
            Catalog::new()
        } else {
            let mut loaded = store::load(&self.catalog_path);
            store::retain_existing(&mut loaded, &self.rom_root);
            loaded
        };

        let mut next = Catalog::new();
        let mut probes: Vec<Probe> = Vec::new();
        // Entries held back while their archive is re-verified.
        let mut held: BTreeMap<String, CatalogEntry> = BTreeMap::new();
        // key -> stem term for the arcade partition.
        let mut arcade_pending: BTreeMap<String, String> = BTreeMap::new();

        for path in scanner::scan_files(&self.rom_root) {
            stats.scanned += 1;
            if !self.validator.is_catalogable(&path) {
                continue;
            }
            let Some(key) = scanner::relative_key(&self.rom_root, &path) else {
                continue;
            };
            let Some(system) = system_of(&key).map(str::to_string) else {
                continue;
            };
            stats.valid += 1;

            if self.naming_excluded.contains(&system) {
                match previous.remove(&key) {
                    Some(entry) => {
                        next.insert(key, entry);
                        stats.retained += 1;
                    }
                    None => {
                        let entry = self.parser.parse(&key, None, NamingMode::Excluded);
                        next.insert(key, entry);
                        stats.heuristic += 1;
                    }
                }
                continue;
            }

            let prev = previous.remove(&key);

            if self.arcade_systems.contains(&system) {
                match prev {
                    Some(entry) if matches!(entry.identity, Identity::ArcadeStem(_)) => {
                        next.insert(key, entry);
                        stats.retained += 1;
                    }
                    _ => {
                        let stem = stem_of(&key).to_string();
                        arcade_pending.insert(key, stem);
                    }
                }
                continue;
            }

            let kind = RomFileKind::from_path(&path);
            match prev {
                // Regular file with a recorded CRC identity: content-change
                // detection would mean re-hashing every file every run, so
                // the entry is retained on existence alone.
                Some(entry)
                    if kind == RomFileKind::RegularFile
                        && matches!(entry.identity, Identity::Crc(_)) =>
                {
                    next.insert(key, entry);
                    stats.retained += 1;
                }
                // Archive with a recorded CRC: member listing is cheap, so
                // verify the stored identity against the fresh inner set.
                Some(entry) if kind.is_archive() => {
                    if let Identity::Crc(stored) = entry.identity.clone() {
                        probes.push(Probe {
                            key: key.clone(),
                            path,
                            kind,
                            verify: Some(stored),
                        });
                        held.insert(key, entry);
                    } else {
                        probes.push(Probe {
                            key,
                            path,
                            kind,
                            verify: None,
                        });
                    }
                }
                _ => {
                    probes.push(Probe {
                        key,
                        path,
                        kind,
                        verify: None,
                    });
                }
            }
        }

        // ── Resolving ───────────────────────────────────────────────────
        self.phase = BuildPhase::Resolving;
        log::info!(
            "Resolving {} probed files and {} arcade stems",
            probes.len(),
            arcade_pending.len()
        );

        // key -> valid candidate CRCs, in archive member order.
        let mut console_pending: BTreeMap<String, Vec<String>> = BTreeMap::new();

        if !probes.is_empty() {
            let pool = WorkerPool::start(self.workers, probes, |probe: Probe| async move {
                let key = probe.key.clone();
                let kind = probe.kind;
                match tokio::task::spawn_blocking(move || probe_file(probe)).await {
                    Ok(outcome) => outcome,
                    Err(e) => ProbeOutcome {
                        key,
                        kind,
                        verify: None,
                        candidates: Vec::new(),
                        error: Some(format!("worker failed: {e}")),
                    },
                }
            });

            for outcome in pool.collect().await {
                if let Some(error) = outcome.error {
                    log::warn!("Skipping {}: {error}", outcome.key);
                    held.remove(&outcome.key);
                    stats.failed += 1;
                    continue;
                }

                let system = system_of(&outcome.key).unwrap_or_default().to_string();
                let mut seen = HashSet::new();
                let candidates: Vec<String> = outcome
                    .candidates
                    .iter()
                    .filter(|member| {
                        outcome.kind == RomFileKind::RegularFile
                            || self.validator.member_allowed(&system, &member.name)
                    })
                    .map(|member| member.crc32.clone())
                    .filter(|crc| seen.insert(crc.clone()))
                    .collect();

                // Incremental fast path: an unchanged single-member archive
                // keeps its previous entry without touching the database.
                if let Some(stored) = &outcome.verify {
                    if candidates.len() == 1 && candidates[0] == *stored {
                        if let Some(entry) = held.remove(&outcome.key) {
                            next.insert(outcome.key, entry);
                            stats.retained += 1;
                            continue;
                        }
                    }
                    held.remove(&outcome.key);
                }

                console_pending.insert(outcome.key, candidates);
            }
        }

        let mut arcade_batch = QueryBatch::new();
        for (key, stem) in &arcade_pending {
            arcade_batch.push(key.clone(), stem.clone());
        }
        let mut console_batch = QueryBatch::new();
        for (key, candidates) in &console_pending {
            for crc in candidates {
                console_batch.push(key.clone(), crc.clone());
            }
        }

        // The partitions are independent: losing one reference database
        // degrades only that partition to heuristic naming.
        let arcade_outcomes = self.arcade_db.query(&arcade_batch).unwrap_or_else(|e| {
            log::warn!("Arcade reference database unavailable: {e}");
            BTreeMap::new()
        });
        let console_outcomes = self.console_db.query(&console_batch).unwrap_or_else(|e| {
            log::warn!("Console reference database unavailable: {e}");
            BTreeMap::new()
        });

        // ── Merging ─────────────────────────────────────────────────────
        self.phase = BuildPhase::Merging;

        for (key, _stem) in arcade_pending {
            match arcade_outcomes.get(&key) {
                Some(ResolutionOutcome::Match(entry)) => {
                    next.insert(key, entry.clone());
                    stats.db_matched += 1;
                }
                other => {
                    if matches!(other, Some(ResolutionOutcome::Ambiguous)) {
                        stats.ambiguous += 1;
                    }
                    let entry = self.parser.parse(&key, None, NamingMode::Standard);
                    next.insert(key, entry);
                    stats.heuristic += 1;
                }
            }
        }

        for (key, candidates) in console_pending {
            match console_outcomes.get(&key) {
                Some(ResolutionOutcome::Match(entry)) => {
                    next.insert(key, entry.clone());
                    stats.db_matched += 1;
                }
                other => {
                    if matches!(other, Some(ResolutionOutcome::Ambiguous)) {
                        log::debug!("Ambiguous reference match for {key}, keeping heuristic name");
                        stats.ambiguous += 1;
                    }
                    let crc = candidates.first().map(String::as_str);
                    let entry = self.parser.parse(&key, crc, NamingMode::Standard);
                    next.insert(key, entry);
                    stats.heuristic += 1;
                }
            }
        }

        // ── Persisted ───────────────────────────────────────────────────
        store::save(&self.catalog_path, &next)?;
        self.catalog = next;
        self.phase = BuildPhase::Persisted;
        log::info!(
            "Catalog persisted: {} entries ({} retained, {} matched, {} heuristic, {} failed)",
            self.catalog.len(),
            stats.retained,
            stats.db_matched,
            stats.heuristic,
            stats.failed
        );
        Ok(stats)
    }
}
