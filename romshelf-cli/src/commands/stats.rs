use std::collections::BTreeMap;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romshelf_catalog::types::system_of;
use romshelf_lib::settings::Settings;

/// Print catalog statistics.
pub(crate) fn run(settings: &Settings) {
    let catalog = romshelf_catalog::store::load(&settings.catalog_path);
    if catalog.is_empty() {
        log::info!("Catalog is empty.");
        return;
    }

    if let Some(meta) = romshelf_catalog::store::load_meta(&settings.catalog_path) {
        log::info!("Catalog generated {}", meta.generated);
    }
    log::info!(
        "{}",
        format!("{} entries", catalog.len()).if_supports_color(Stdout, |t| t.bold()),
    );

    let mut by_method: BTreeMap<&str, usize> = BTreeMap::new();
    let mut by_system: BTreeMap<&str, usize> = BTreeMap::new();
    for (key, entry) in &catalog {
        *by_method.entry(entry.identity.method()).or_default() += 1;
        if let Some(system) = system_of(key) {
            *by_system.entry(system).or_default() += 1;
        }
    }

    log::info!("By identity method:");
    for (method, count) in &by_method {
        log::info!("  {method:<12} {count:>6}");
    }
    log::info!("By system:");
    for (system, count) in &by_system {
        log::info!("  {system:<12} {count:>6}");
    }
}
