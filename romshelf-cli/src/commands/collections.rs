use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romshelf_catalog::types::{system_of, CatalogEntry};
use romshelf_frontend::{build_group, CacheLeaf};
use romshelf_lib::collection::{self, CollectionMatcher, Shortcut};
use romshelf_lib::scanner;
use romshelf_lib::settings::Settings;

/// Evaluate collection rules, write shortcut files and per-collection
/// cache tables.
pub(crate) fn run(settings: &Settings) {
    let catalog = romshelf_catalog::store::load(&settings.catalog_path);
    if catalog.is_empty() {
        log::warn!("Catalog is empty; run 'romshelf rebuild' first.");
        return;
    }

    let rules = match collection::load_rules(&settings.collections_file) {
        Ok(rules) => rules,
        Err(e) => {
            log::error!("Could not load collection rules: {e}");
            std::process::exit(1);
        }
    };

    let matcher = CollectionMatcher::new(&rules);
    let groups = matcher.collect(&catalog);

    for (name, members) in &groups {
        let shortcuts: Vec<Shortcut> = members
            .iter()
            .map(|(key, entry)| Shortcut {
                name: display_of(entry),
                target: scanner::absolute_path(&settings.rom_root, key),
            })
            .collect();

        match collection::write_shortcuts(&settings.collections_root, name, &shortcuts) {
            Ok(written) => log::info!(
                "  {} {name}: {written} shortcuts",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
            ),
            Err(e) => {
                log::warn!(
                    "  {} {name}: {e}",
                    "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
                );
                continue;
            }
        }

        // The collection's cache table mirrors its shortcut directory, one
        // flat level of entries pointing back at the source ROMs.
        let leaves: Vec<CacheLeaf> = members
            .iter()
            .zip(&shortcuts)
            .map(|((key, entry), shortcut)| CacheLeaf {
                rel_path: shortcut.file_name(),
                display: display_of(entry),
                launch_path: shortcut.target.clone(),
                image_path: image_path_for(&settings.rom_root, key),
                arcade: system_of(key)
                    .map(|s| settings.arcade_systems.iter().any(|a| a == s))
                    .unwrap_or(false),
            })
            .collect();

        let group_root = settings.collections_root.join(name);
        if let Err(e) = build_group(&settings.cache_output, name, &group_root, &leaves) {
            log::warn!("Cache table for collection '{name}' failed: {e}");
        }
    }
}

fn display_of(entry: &CatalogEntry) -> String {
    if entry.name.is_empty() {
        entry.title.clone()
    } else {
        entry.name.clone()
    }
}

/// Artwork for a collection member lives with its source system:
/// `<system>/Imgs/<subpath>/<stem>.png`.
fn image_path_for(rom_root: &Path, key: &str) -> std::path::PathBuf {
    let Some(system) = system_of(key) else {
        return rom_root.join("Imgs/unknown.png");
    };
    let rel = &key[system.len() + 1..];
    let mut path = rom_root.join(system).join("Imgs");
    path.extend(Path::new(rel).iter());
    path.set_extension("png");
    path
}
