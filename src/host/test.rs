use super::generic::{FileStore, MemStore, SimRelays, SystemClock};
use super::{Clock, Hardware, Storage};

#[test]
fn test_sim_relays_are_idempotent() {
    let mut hw = SimRelays::new();

    hw.start_relay(5).unwrap();
    hw.start_relay(5).unwrap();
    hw.start_relay(5).unwrap();
    assert!(hw.is_on(5));
    assert_eq!(hw.starts(5), 1);

    hw.stop_relay(5).unwrap();
    hw.stop_relay(5).unwrap();
    assert!(!hw.is_on(5));
    assert_eq!(hw.stops(5), 1);

    // a line never touched
    assert!(!hw.is_on(6));
    assert_eq!(hw.starts(6), 0);
}

#[test]
fn test_mem_store_round_trip() {
    let mut store = MemStore::new();
    let mut buf = [0u8; 8];

    assert!(store.load(&mut buf).is_err());

    store.store(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    store.load(&mut buf).unwrap();
    assert_eq!(buf, [1, 2, 3, 4, 5, 6, 7, 8]);

    // length mismatch is a load failure
    let mut short = [0u8; 4];
    assert!(store.load(&mut short).is_err());
}

#[test]
fn test_file_store_missing_file_fails_to_load() {
    let path = std::env::temp_dir().join(format!("sprinkler-missing-{}.dat", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let mut store = FileStore::new(&path);
    let mut buf = [0u8; 4];
    assert!(store.load(&mut buf).is_err());

    store.store(&[9, 9, 9, 9]).unwrap();
    store.load(&mut buf).unwrap();
    assert_eq!(buf, [9, 9, 9, 9]);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_system_clock_reports_sane_fields() {
    let (t, _epoch) = SystemClock.now().unwrap();
    assert!(t.year >= 2020);
    assert!(t.month < 12);
    assert!(t.weekday < 7);
    assert!(t.hour < 24);
    assert!(t.minute < 60);
    assert!(t.second < 61);
}
