use romshelf_catalog::name_parser::{NameParser, NamingMode};
use romshelf_catalog::types::Identity;

#[test]
fn parses_region_disc_and_version() {
    let parser = NameParser::new();
    let entry = parser.parse(
        "PS/Super Game (Europe) (Disc 1) (v1.2).zip",
        None,
        NamingMode::Standard,
    );

    assert_eq!(entry.title, "Super Game (Europe) (Disc 1) (v1.2)");
    assert_eq!(entry.name, "Super Game");
    assert_eq!(entry.regions, vec!["EU"]);
    assert_eq!(entry.discs, vec!["DISC 1"]);
    assert_eq!(entry.version.as_deref(), Some("v1.2"));
}

#[test]
fn world_expands_to_multiple_regions() {
    let parser = NameParser::new();
    let entry = parser.parse("MD/Thing (World).md", None, NamingMode::Standard);
    assert_eq!(entry.regions, vec!["US", "EU", "JP"]);
}

#[test]
fn region_order_follows_appearance() {
    let parser = NameParser::new();
    let entry = parser.parse("MD/Thing (Japan, USA).md", None, NamingMode::Standard);
    assert_eq!(entry.regions, vec!["JP", "US"]);
}

#[test]
fn duplicate_regions_are_collapsed() {
    let parser = NameParser::new();
    let entry = parser.parse("MD/Thing (USA) (World).md", None, NamingMode::Standard);
    // "World" re-contributes US; the set is order-preserving and unique.
    assert_eq!(entry.regions, vec!["US", "EU", "JP"]);
}

#[test]
fn multi_word_regions_tokenize_atomically() {
    let parser = NameParser::new();
    let entry = parser.parse("MD/Thing (Hong Kong).md", None, NamingMode::Standard);
    assert_eq!(entry.regions, vec!["HK"]);
}

#[test]
fn format_and_year_and_hack() {
    let parser = NameParser::new();
    let entry = parser.parse(
        "SFC/Thing (PAL) (1994) (Color Hack).sfc",
        None,
        NamingMode::Standard,
    );
    assert_eq!(entry.formats, vec!["PAL"]);
    assert_eq!(entry.year.as_deref(), Some("1994"));
    assert_eq!(entry.hack.as_deref(), Some("Color Hack"));
}

#[test]
fn unrecognized_segments_become_extra_tags() {
    let parser = NameParser::new();
    let entry = parser.parse("SFC/Thing (En,Fr,De).sfc", None, NamingMode::Standard);
    assert!(entry.regions.is_empty());
    assert_eq!(entry.extra, vec!["En,Fr,De"]);
}

#[test]
fn nested_brackets_strip_to_fixpoint() {
    let parser = NameParser::new();
    assert_eq!(
        parser.clean_name("Game [a (weird) tag] {x}  trailing"),
        "Game trailing"
    );
}

#[test]
fn provisional_crc_identity() {
    let parser = NameParser::new();
    let entry = parser.parse("MD/Thing.md", Some("cbf43926"), NamingMode::Standard);
    assert_eq!(entry.identity, Identity::Crc("cbf43926".into()));

    let entry = parser.parse("PORTS/thing.sh", Some("cbf43926"), NamingMode::Excluded);
    assert_eq!(entry.identity, Identity::Heuristic);

    let entry = parser.parse("MD/Thing.md", None, NamingMode::Standard);
    assert_eq!(entry.identity, Identity::Heuristic);
}

#[test]
fn malformed_input_never_panics() {
    let parser = NameParser::new();
    for name in [
        "MD/((((.md",
        "MD/)(.md",
        "MD/().md",
        "MD/Game (.md",
        "MD/[[[]{}.md",
        "MD/",
        "",
    ] {
        let entry = parser.parse(name, None, NamingMode::Standard);
        assert!(entry.name.len() <= entry.title.len());
    }
}
