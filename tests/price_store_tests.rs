use std::path::PathBuf;

use kalman_pairs::price_store::{load_price_table, load_symbol_closes, persist_closes};

fn scratch_db(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("kalman_pairs_store_{}_{}", name, std::process::id()));
    std::fs::remove_dir_all(&dir).ok();
    dir.join("prices.sqlite")
}

#[test]
/// Verifies closes written to sqlite load back sorted by timestamp, with the
/// symbol normalized to upper case on both sides.
fn closes_round_trip_persistence() {
    let db = scratch_db("round_trip");
    let written = persist_closes(&db, "gld", &[(3, 103.0), (1, 101.0), (2, 102.0)])
        .expect("persist should succeed");
    assert_eq!(written, 3);

    let loaded = load_symbol_closes(&db, "GLD").expect("load should succeed");
    assert_eq!(loaded, vec![(1, 101.0), (2, 102.0), (3, 103.0)]);
    assert_eq!(load_symbol_closes(&db, " gld ").unwrap(), loaded);
    std::fs::remove_dir_all(db.parent().unwrap()).ok();
}

#[test]
/// Verifies re-importing a timestamp overwrites the stored close instead of
/// duplicating the row.
fn reimport_overwrites_existing_close() {
    let db = scratch_db("upsert");
    persist_closes(&db, "GDX", &[(1, 20.0), (2, 21.0)]).unwrap();
    persist_closes(&db, "GDX", &[(2, 21.5), (3, 22.0)]).unwrap();

    let loaded = load_symbol_closes(&db, "GDX").unwrap();
    assert_eq!(loaded, vec![(1, 20.0), (2, 21.5), (3, 22.0)]);
    std::fs::remove_dir_all(db.parent().unwrap()).ok();
}

#[test]
fn missing_symbol_returns_empty() {
    let db = scratch_db("missing");
    persist_closes(&db, "GLD", &[(1, 100.0)]).unwrap();
    assert!(load_symbol_closes(&db, "UNKNOWN").unwrap().is_empty());
    std::fs::remove_dir_all(db.parent().unwrap()).ok();
}

#[test]
/// Verifies the loaded table aligns stored symbols into a runnable pair,
/// forward-filling the leg that skipped a day.
fn loaded_table_builds_aligned_pairs() {
    let db = scratch_db("table");
    persist_closes(&db, "GLD", &[(1, 100.0), (2, 101.0), (3, 102.0)]).unwrap();
    persist_closes(&db, "GDX", &[(1, 20.0), (3, 22.0)]).unwrap();

    let table = load_price_table(&db).unwrap();
    assert_eq!(table.symbols(), vec!["GDX".to_string(), "GLD".to_string()]);

    let pair = table.pair("GLD", "GDX").unwrap();
    assert_eq!(pair.leg_x(), "GLD");
    assert_eq!(pair.leg_y(), "GDX");
    assert_eq!(pair.timestamps_ms().collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(pair.prices_y().collect::<Vec<_>>(), vec![20.0, 20.0, 22.0]);
    std::fs::remove_dir_all(db.parent().unwrap()).ok();
}
