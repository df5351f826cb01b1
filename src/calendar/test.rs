use super::{matching_slot, monday_based};
use crate::config::SprinklerConfig;
use crate::host::LocalTime;

fn matching_config() -> (SprinklerConfig, LocalTime) {
    let mut cfg = SprinklerConfig::default();
    cfg.set_month_enabled(5, true).unwrap();
    cfg.set_month_slot(5, 2).unwrap();
    cfg.set_slot_enabled(2, true).unwrap();
    cfg.set_slot_hour(2, 14, true).unwrap();
    cfg.set_slot_weekday(2, 2, true).unwrap(); // Wednesday, Monday-based
    #[cfg(feature = "minute-precision")]
    cfg.set_slot_minute(2, 14, 30).unwrap();

    let t = LocalTime {
        year: 2026,
        month: 5,
        weekday: 3, // Wednesday as the clock reports it
        hour: 14,
        #[cfg(feature = "minute-precision")]
        minute: 30,
        #[cfg(not(feature = "minute-precision"))]
        minute: 42,
        second: 0,
    };
    (cfg, t)
}

#[test]
fn test_weekday_adjustment() {
    assert_eq!(monday_based(0), 6); // Sunday
    assert_eq!(monday_based(1), 0); // Monday
    assert_eq!(monday_based(6), 5); // Saturday
}

#[test]
fn test_full_match() {
    let (cfg, t) = matching_config();
    assert_eq!(matching_slot(&cfg, &t), Some(2));
    assert!(cfg.is_start_time(&t));
}

#[test]
fn test_disabled_month_blocks_match() {
    let (mut cfg, t) = matching_config();
    cfg.set_month_enabled(5, false).unwrap();
    assert_eq!(matching_slot(&cfg, &t), None);
}

#[test]
fn test_disabled_slot_blocks_match() {
    let (mut cfg, t) = matching_config();
    cfg.set_slot_enabled(2, false).unwrap();
    assert_eq!(matching_slot(&cfg, &t), None);
}

#[test]
fn test_wrong_hour_blocks_match() {
    let (cfg, mut t) = matching_config();
    t.hour = 15;
    assert_eq!(matching_slot(&cfg, &t), None);
}

#[test]
fn test_wrong_weekday_blocks_match() {
    let (cfg, mut t) = matching_config();
    t.weekday = 4; // Thursday
    assert_eq!(matching_slot(&cfg, &t), None);
}

#[cfg(feature = "minute-precision")]
#[test]
fn test_wrong_minute_blocks_match() {
    let (cfg, mut t) = matching_config();
    t.minute = 31;
    assert_eq!(matching_slot(&cfg, &t), None);
}

#[test]
fn test_month_picks_its_own_slot() {
    let (mut cfg, mut t) = matching_config();
    // July points at a slot that never fires.
    cfg.set_month_enabled(6, true).unwrap();
    cfg.set_month_slot(6, 9).unwrap();
    t.month = 6;
    assert_eq!(matching_slot(&cfg, &t), None);
}
