use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romshelf_lib::builder::CatalogBuilder;
use romshelf_lib::settings::Settings;

/// Rebuild the catalog, optionally followed by the cache tables.
pub(crate) fn run(settings: &Settings, reset: bool, cache: bool) {
    let mut builder = CatalogBuilder::new(settings);

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("  {spinner:.cyan} {msg}")
            .unwrap()
            .tick_chars("/-\\|"),
    );
    pb.set_message(format!("Cataloging {}...", settings.rom_root.display()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = rt.block_on(builder.rebuild(reset));
    pb.finish_and_clear();

    let stats = match result {
        Ok(stats) => stats,
        Err(e) => {
            log::error!("Rebuild failed: {e}");
            std::process::exit(1);
        }
    };

    log::info!(
        "{} Catalog rebuilt: {} entries",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        builder.catalog().len(),
    );
    log::info!("  Files scanned:  {:>6}", stats.scanned);
    log::info!("  Catalogable:    {:>6}", stats.valid);
    log::info!("  Retained:       {:>6}", stats.retained);
    log::info!("  Matched:        {:>6}", stats.db_matched);
    log::info!("  Heuristic:      {:>6}", stats.heuristic);
    if stats.ambiguous > 0 {
        log::info!("  Ambiguous:      {:>6}", stats.ambiguous);
    }
    if stats.failed > 0 {
        log::info!(
            "  {} Skipped on I/O errors: {}",
            "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
            stats.failed,
        );
    }

    if cache {
        super::cache::build_tables(settings, builder.catalog());
    }

    // The forced-rebuild flag is one-shot; clear it once honored.
    if settings.rebuild_required {
        let mut cleared = settings.clone();
        cleared.rebuild_required = false;
        let path = romshelf_lib::settings::settings_path();
        if let Err(e) = romshelf_lib::settings::save(&path, &cleared) {
            log::warn!("Could not clear rebuild flag in settings: {e}");
        }
    }
}
