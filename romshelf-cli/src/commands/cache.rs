use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romshelf_catalog::types::Catalog;
use romshelf_frontend::{build_group, catalog_leaves};
use romshelf_lib::settings::Settings;

/// Rebuild cache tables from the persisted catalog.
pub(crate) fn run(settings: &Settings) {
    let catalog = romshelf_catalog::store::load(&settings.catalog_path);
    if catalog.is_empty() {
        log::warn!("Catalog is empty; run 'romshelf rebuild' first.");
        return;
    }
    build_tables(settings, &catalog);
}

/// Write one cache table per system in the catalog.
pub(crate) fn build_tables(settings: &Settings, catalog: &Catalog) {
    let groups = catalog_leaves(catalog, &settings.rom_root, |system| {
        settings.arcade_systems.iter().any(|a| a == system)
    });

    for (system, leaves) in &groups {
        let group_root = settings.rom_root.join(system);
        match build_group(&settings.cache_output, system, &group_root, leaves) {
            Ok(rows) => log::info!(
                "  {} {system}: {rows} rows",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
            ),
            Err(e) => log::warn!(
                "  {} {system}: {e}",
                "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
            ),
        }
    }
}
