//! Calendar trigger matching.
//!
//! A schedule slot fires when the current month points at it, the month
//! and the slot are both enabled, and the slot's hour and weekday bits
//! cover the sampled time. With the `minute-precision` feature the slot's
//! per-hour start minute must match as well; without it, matching is on
//! the hour.
//!
//! The tick turns a match into a trigger at most once per minute (or hour)
//! via the memoization fields in the runtime state; this module is pure.

#[cfg(test)]
mod test;

use crate::config::SprinklerConfig;
use crate::host::LocalTime;

/// Monday-based weekday (0 = Monday .. 6 = Sunday) from the clock's
/// Sunday-based `tm_wday` value.
pub(crate) fn monday_based(weekday: u8) -> u8 {
    if weekday == 0 {
        6
    } else {
        weekday - 1
    }
}

/// The schedule slot that matches `t`, if any.
pub(crate) fn matching_slot(cfg: &SprinklerConfig, t: &LocalTime) -> Option<u8> {
    let month = cfg.month.get(t.month as usize)?;
    if !month.enabled() {
        return None;
    }
    let sid = month.slot_id();
    let slot = cfg.schedule[sid as usize];
    if !slot.enabled() || !slot.hour(t.hour) || !slot.weekday(monday_based(t.weekday)) {
        return None;
    }
    #[cfg(feature = "minute-precision")]
    if cfg.schedule_minute[sid as usize][t.hour as usize] != t.minute {
        return None;
    }
    Some(sid)
}

impl SprinklerConfig {
    /// Whether `t` is a scheduled start instant for the current month's
    /// slot. This is the raw predicate; the tick additionally fires it
    /// only once per matching minute.
    pub fn is_start_time(&self, t: &LocalTime) -> bool {
        matching_slot(self, t).is_some()
    }
}
