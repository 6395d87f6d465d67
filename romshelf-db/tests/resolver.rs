use rusqlite::{params, Connection};

use romshelf_catalog::types::Identity;
use romshelf_db::{open_memory, resolver, IdentityKind, QueryBatch, ResolutionOutcome};

fn insert_rom(conn: &Connection, id: i64, title: &str, name: &str, identity: &str) {
    conn.execute(
        "INSERT INTO rom (id, title, name, source, identity) VALUES (?1, ?2, ?3, 'test', ?4)",
        params![id, title, name, identity],
    )
    .unwrap();
}

fn insert_attr(conn: &Connection, table: &str, rom_id: i64, name: &str) {
    conn.execute(
        &format!("INSERT INTO {table} (rom_id, name) VALUES (?1, ?2)"),
        params![rom_id, name],
    )
    .unwrap();
}

fn fixture() -> Connection {
    let conn = open_memory().unwrap();
    insert_rom(&conn, 1, "Super Game (Europe)", "Super Game", "aaaaaaaa");
    insert_rom(&conn, 2, "Other Game (Japan)", "Other Game", "bbbbbbbb");
    insert_rom(&conn, 3, "Third Game (USA)", "Third Game", "cccccccc");
    insert_attr(&conn, "region", 1, "EU");
    insert_attr(&conn, "region", 1, "UK");
    insert_attr(&conn, "disc", 1, "DISC 1");
    insert_attr(&conn, "format", 1, "PAL");
    insert_attr(&conn, "additional", 1, "budget release");
    insert_attr(&conn, "region", 2, "JP");
    conn
}

#[test]
fn empty_batch_is_a_no_op() {
    let conn = fixture();
    let outcomes = resolver::resolve(&conn, &QueryBatch::new(), IdentityKind::Crc).unwrap();
    assert!(outcomes.is_empty());
}

#[test]
fn single_match_carries_attributes_in_order() {
    let conn = fixture();
    let mut batch = QueryBatch::new();
    batch.push("PS/game.zip", "aaaaaaaa");

    let outcomes = resolver::resolve(&conn, &batch, IdentityKind::Crc).unwrap();
    match &outcomes["PS/game.zip"] {
        ResolutionOutcome::Match(entry) => {
            assert_eq!(entry.title, "Super Game (Europe)");
            assert_eq!(entry.name, "Super Game");
            assert_eq!(entry.identity, Identity::Crc("aaaaaaaa".into()));
            assert_eq!(entry.regions, vec!["EU", "UK"]);
            assert_eq!(entry.discs, vec!["DISC 1"]);
            assert_eq!(entry.formats, vec!["PAL"]);
            assert_eq!(entry.extra, vec!["budget release"]);
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn unknown_identity_is_unmatched() {
    let conn = fixture();
    let mut batch = QueryBatch::new();
    batch.push("PS/unknown.zip", "99999999");

    let outcomes = resolver::resolve(&conn, &batch, IdentityKind::Crc).unwrap();
    assert_eq!(outcomes["PS/unknown.zip"], ResolutionOutcome::Unmatched);
}

#[test]
fn two_keys_on_one_row_are_both_ambiguous() {
    // Two archives both contain the same inner ROM. The reference row must
    // not be attributed to either of them.
    let conn = fixture();
    let mut batch = QueryBatch::new();
    batch.push("PS/a.zip", "aaaaaaaa");
    batch.push("PS/b.zip", "aaaaaaaa");

    let outcomes = resolver::resolve(&conn, &batch, IdentityKind::Crc).unwrap();
    assert_eq!(outcomes["PS/a.zip"], ResolutionOutcome::Ambiguous);
    assert_eq!(outcomes["PS/b.zip"], ResolutionOutcome::Ambiguous);
}

#[test]
fn contested_row_rejects_later_claimants_too() {
    let conn = fixture();
    let mut batch = QueryBatch::new();
    batch.push("PS/a.zip", "aaaaaaaa");
    batch.push("PS/b.zip", "aaaaaaaa");
    batch.push("PS/c.zip", "aaaaaaaa");

    let outcomes = resolver::resolve(&conn, &batch, IdentityKind::Crc).unwrap();
    for key in ["PS/a.zip", "PS/b.zip", "PS/c.zip"] {
        assert_eq!(outcomes[key], ResolutionOutcome::Ambiguous, "{key}");
    }
}

#[test]
fn one_key_with_two_plausible_matches_is_ambiguous() {
    // An archive holding two different known ROMs cannot pick one.
    let conn = fixture();
    let mut batch = QueryBatch::new();
    batch.push("PS/multi.zip", "aaaaaaaa");
    batch.push("PS/multi.zip", "bbbbbbbb");

    let outcomes = resolver::resolve(&conn, &batch, IdentityKind::Crc).unwrap();
    assert_eq!(outcomes["PS/multi.zip"], ResolutionOutcome::Ambiguous);
}

#[test]
fn retracted_row_stays_claimable_by_another_key() {
    // multi.zip matches rows 1 and 2 and gets blacklisted; its briefly
    // held row must remain available to a clean later claimant.
    let conn = fixture();
    let mut batch = QueryBatch::new();
    batch.push("PS/multi.zip", "aaaaaaaa");
    batch.push("PS/multi.zip", "bbbbbbbb");
    batch.push("PS/solo.zip", "aaaaaaaa");

    let outcomes = resolver::resolve(&conn, &batch, IdentityKind::Crc).unwrap();
    assert_eq!(outcomes["PS/multi.zip"], ResolutionOutcome::Ambiguous);
    assert!(matches!(
        outcomes["PS/solo.zip"],
        ResolutionOutcome::Match(_)
    ));
}

#[test]
fn non_matching_candidates_do_not_count_toward_ambiguity() {
    let conn = fixture();
    let mut batch = QueryBatch::new();
    batch.push("PS/padded.zip", "11111111");
    batch.push("PS/padded.zip", "cccccccc");
    batch.push("PS/padded.zip", "22222222");

    let outcomes = resolver::resolve(&conn, &batch, IdentityKind::Crc).unwrap();
    match &outcomes["PS/padded.zip"] {
        ResolutionOutcome::Match(entry) => {
            assert_eq!(entry.identity, Identity::Crc("cccccccc".into()));
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn arcade_kind_produces_stem_identity() {
    let conn = open_memory().unwrap();
    insert_rom(&conn, 1, "sf2", "Street Fighter II", "sf2");

    let mut batch = QueryBatch::new();
    batch.push("MAME/sf2.zip", "sf2");

    let outcomes = resolver::resolve(&conn, &batch, IdentityKind::ArcadeStem).unwrap();
    match &outcomes["MAME/sf2.zip"] {
        ResolutionOutcome::Match(entry) => {
            assert_eq!(entry.identity, Identity::ArcadeStem("sf2".into()));
            assert_eq!(entry.name, "Street Fighter II");
        }
        other => panic!("expected match, got {other:?}"),
    }
}
