//! Canonical configuration aggregate and its validated mutators.
//!
//! [`SprinklerConfig`] owns everything the controller knows: the persisted
//! schedule/relay/pump/queue records and the volatile runtime state the
//! engine advances on every tick. All operations take it by exclusive
//! reference; there is no global state, so independent controller instances
//! never interfere.
//!
//! Every mutator validates before it writes. An out-of-range identifier
//! returns [`Error::Param`], a value wider than its field returns
//! [`Error::Range`], and in both cases the aggregate is untouched. A
//! successful write marks the configuration dirty so the engine's periodic
//! flush picks it up.

pub mod persist;

use crate::codec::{MonthByte, PauseWord, PumpWord, RelayWord, ScheduleWord};
use crate::error::{Error, Result};

/// Number of schedule slots.
pub const SLOTS: usize = 32;
/// Number of queues.
pub const QUEUES: usize = 32;
/// Number of relays.
pub const RELAYS: usize = 32;
/// Number of supply pumps.
pub const PUMPS: usize = 5;
/// Number of calendar months.
pub const MONTHS: usize = 12;
/// Hours per day.
pub const HOURS: usize = 24;

/// Pump-id value meaning "this relay needs no pump".
pub const NO_PUMP: u8 = 5;

/// Seconds between periodic configuration saves.
pub const PERSIST_PERIOD_SECS: u32 = 15;

/// Override row reserved for the per-relay pause table.
pub(crate) const PAUSE_ROW: usize = 31;

/// The controller's entire state: persisted configuration plus volatile
/// runtime bookkeeping.
///
/// Constructed zeroed by [`Default`]; [`Controller::new`] then overlays
/// whatever the storage gateway can load.
///
/// [`Controller::new`]: crate::engine::Controller::new
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SprinklerConfig {
    // Persisted portion, in on-disk field order (see `persist`).
    pub(crate) pump: PumpWord,
    pub(crate) schedule: [ScheduleWord; SLOTS],
    #[cfg(feature = "minute-precision")]
    pub(crate) schedule_minute: [[u8; HOURS]; SLOTS],
    pub(crate) schedule_queues: [u32; SLOTS],
    pub(crate) relay: [RelayWord; RELAYS],
    pub(crate) relay_overlap_ms: [u32; RELAYS],
    pub(crate) month: [MonthByte; MONTHS],
    pub(crate) pump_delay_ms: u32,
    pub(crate) queue_members: [u32; QUEUES],
    pub(crate) queue_repeat: [u8; QUEUES],
    // Row `PAUSE_ROW` holds per-relay pauses, never member durations.
    pub(crate) override_secs: [[u16; RELAYS]; QUEUES],
    pub(crate) queue_pause: [PauseWord; QUEUES],
    pub(crate) relay_gpio: [u8; RELAYS],

    // Volatile runtime state, zeroed at init.
    pub(crate) dirty: bool,
    pub(crate) queue_running: u32,
    pub(crate) queue_paused: [bool; QUEUES],
    pub(crate) relay_running: u32,
    pub(crate) current_idx: [u8; QUEUES],
    pub(crate) pause_end: [u32; QUEUES],
    pub(crate) repeat_count: [u8; QUEUES],
    pub(crate) active_pumps: u8,
    pub(crate) relay_end: [[u32; RELAYS]; QUEUES],
    pub(crate) pump_start: [u32; PUMPS],
    pub(crate) last_persist: u32,
    #[cfg(feature = "minute-precision")]
    pub(crate) last_trigger_minute: Option<u8>,
    #[cfg(not(feature = "minute-precision"))]
    pub(crate) last_trigger_hour: Option<u8>,
}

fn check(ok: bool) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(Error::Param)
    }
}

fn check_range(ok: bool) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(Error::Range)
    }
}

impl SprinklerConfig {
    // --- schedule slots ---

    /// Enables or disables schedule slot `slot`.
    pub fn set_slot_enabled(&mut self, slot: u8, en: bool) -> Result<()> {
        check((slot as usize) < SLOTS)?;
        self.schedule[slot as usize].set_enabled(en);
        self.dirty = true;
        Ok(())
    }

    /// Sets or clears one hour bit of schedule slot `slot`.
    pub fn set_slot_hour(&mut self, slot: u8, hour: u8, en: bool) -> Result<()> {
        check((slot as usize) < SLOTS && (hour as usize) < HOURS)?;
        self.schedule[slot as usize].set_hour(hour, en);
        self.dirty = true;
        Ok(())
    }

    /// Sets or clears one weekday bit of schedule slot `slot`
    /// (0 = Monday .. 6 = Sunday).
    pub fn set_slot_weekday(&mut self, slot: u8, weekday: u8, en: bool) -> Result<()> {
        check((slot as usize) < SLOTS && weekday < 7)?;
        self.schedule[slot as usize].set_weekday(weekday, en);
        self.dirty = true;
        Ok(())
    }

    /// Sets the start minute used when slot `slot` fires during `hour`.
    #[cfg(feature = "minute-precision")]
    pub fn set_slot_minute(&mut self, slot: u8, hour: u8, minute: u8) -> Result<()> {
        check((slot as usize) < SLOTS && (hour as usize) < HOURS)?;
        check_range(minute < 60)?;
        self.schedule_minute[slot as usize][hour as usize] = minute;
        self.dirty = true;
        Ok(())
    }

    /// Adds `queue` to (or removes it from) the set of queues started when
    /// slot `slot` fires.
    pub fn set_slot_queue(&mut self, slot: u8, queue: u8, en: bool) -> Result<()> {
        check((slot as usize) < SLOTS && (queue as usize) < QUEUES)?;
        if en {
            self.schedule_queues[slot as usize] |= 1 << queue;
        } else {
            self.schedule_queues[slot as usize] &= !(1 << queue);
        }
        self.dirty = true;
        Ok(())
    }

    pub fn slot_enabled(&self, slot: u8) -> Result<bool> {
        check((slot as usize) < SLOTS)?;
        Ok(self.schedule[slot as usize].enabled())
    }

    pub fn slot_hour(&self, slot: u8, hour: u8) -> Result<bool> {
        check((slot as usize) < SLOTS && (hour as usize) < HOURS)?;
        Ok(self.schedule[slot as usize].hour(hour))
    }

    pub fn slot_weekday(&self, slot: u8, weekday: u8) -> Result<bool> {
        check((slot as usize) < SLOTS && weekday < 7)?;
        Ok(self.schedule[slot as usize].weekday(weekday))
    }

    #[cfg(feature = "minute-precision")]
    pub fn slot_minute(&self, slot: u8, hour: u8) -> Result<u8> {
        check((slot as usize) < SLOTS && (hour as usize) < HOURS)?;
        Ok(self.schedule_minute[slot as usize][hour as usize])
    }

    /// Bitset of queues started when slot `slot` fires.
    pub fn slot_queues(&self, slot: u8) -> Result<u32> {
        check((slot as usize) < SLOTS)?;
        Ok(self.schedule_queues[slot as usize])
    }

    // --- months ---

    /// Enables or disables scheduling for `month` (0 = January).
    pub fn set_month_enabled(&mut self, month: u8, en: bool) -> Result<()> {
        check((month as usize) < MONTHS)?;
        self.month[month as usize].set_enabled(en);
        self.dirty = true;
        Ok(())
    }

    /// Sets month flag A. The flag has no engine semantics; hosts are free
    /// to use it.
    pub fn set_month_flag_a(&mut self, month: u8, en: bool) -> Result<()> {
        check((month as usize) < MONTHS)?;
        self.month[month as usize].set_flag_a(en);
        self.dirty = true;
        Ok(())
    }

    /// Sets month flag B, the second host-defined flag.
    pub fn set_month_flag_b(&mut self, month: u8, en: bool) -> Result<()> {
        check((month as usize) < MONTHS)?;
        self.month[month as usize].set_flag_b(en);
        self.dirty = true;
        Ok(())
    }

    /// Selects which schedule slot governs `month`.
    pub fn set_month_slot(&mut self, month: u8, slot: u8) -> Result<()> {
        check((month as usize) < MONTHS && (slot as usize) < SLOTS)?;
        self.month[month as usize].set_slot_id(slot);
        self.dirty = true;
        Ok(())
    }

    pub fn month_enabled(&self, month: u8) -> Result<bool> {
        check((month as usize) < MONTHS)?;
        Ok(self.month[month as usize].enabled())
    }

    pub fn month_flag_a(&self, month: u8) -> Result<bool> {
        check((month as usize) < MONTHS)?;
        Ok(self.month[month as usize].flag_a())
    }

    pub fn month_flag_b(&self, month: u8) -> Result<bool> {
        check((month as usize) < MONTHS)?;
        Ok(self.month[month as usize].flag_b())
    }

    pub fn month_slot(&self, month: u8) -> Result<u8> {
        check((month as usize) < MONTHS)?;
        Ok(self.month[month as usize].slot_id())
    }

    // --- relays ---

    /// Enables or disables `relay`. Disabled relays are skipped by every
    /// queue walk.
    pub fn set_relay_enabled(&mut self, relay: u8, en: bool) -> Result<()> {
        check((relay as usize) < RELAYS)?;
        self.relay[relay as usize].set_enabled(en);
        self.dirty = true;
        Ok(())
    }

    /// Assigns the supply pump for `relay`; [`NO_PUMP`] detaches it.
    pub fn set_relay_pump(&mut self, relay: u8, pump: u8) -> Result<()> {
        check((relay as usize) < RELAYS && pump <= NO_PUMP)?;
        self.relay[relay as usize].set_pump_id(pump);
        self.dirty = true;
        Ok(())
    }

    /// Sets the default watering duration of `relay` in minutes (0..4096).
    pub fn set_relay_minutes(&mut self, relay: u8, minutes: u16) -> Result<()> {
        check((relay as usize) < RELAYS)?;
        check_range(minutes < 4096)?;
        self.relay[relay as usize].set_minutes(minutes);
        self.dirty = true;
        Ok(())
    }

    /// Sets how long `relay` keeps running together with its successor
    /// during a queue transition.
    pub fn set_relay_overlap_ms(&mut self, relay: u8, ms: u32) -> Result<()> {
        check((relay as usize) < RELAYS)?;
        self.relay_overlap_ms[relay as usize] = ms;
        self.dirty = true;
        Ok(())
    }

    /// Maps `relay` to the host GPIO line that drives it.
    pub fn set_relay_gpio(&mut self, relay: u8, gpio: u8) -> Result<()> {
        check((relay as usize) < RELAYS)?;
        self.relay_gpio[relay as usize] = gpio;
        self.dirty = true;
        Ok(())
    }

    pub fn relay_enabled(&self, relay: u8) -> Result<bool> {
        check((relay as usize) < RELAYS)?;
        Ok(self.relay[relay as usize].enabled())
    }

    pub fn relay_pump(&self, relay: u8) -> Result<u8> {
        check((relay as usize) < RELAYS)?;
        Ok(self.relay[relay as usize].pump_id())
    }

    pub fn relay_minutes(&self, relay: u8) -> Result<u16> {
        check((relay as usize) < RELAYS)?;
        Ok(self.relay[relay as usize].minutes())
    }

    pub fn relay_overlap_ms(&self, relay: u8) -> Result<u32> {
        check((relay as usize) < RELAYS)?;
        Ok(self.relay_overlap_ms[relay as usize])
    }

    pub fn relay_gpio(&self, relay: u8) -> Result<u8> {
        check((relay as usize) < RELAYS)?;
        Ok(self.relay_gpio[relay as usize])
    }

    // --- queues ---

    /// Adds `relay` to (or removes it from) the member set of `queue`.
    /// Members always execute in ascending relay-id order.
    pub fn set_queue_member(&mut self, queue: u8, relay: u8, en: bool) -> Result<()> {
        check((queue as usize) < QUEUES && (relay as usize) < RELAYS)?;
        if en {
            self.queue_members[queue as usize] |= 1 << relay;
        } else {
            self.queue_members[queue as usize] &= !(1 << relay);
        }
        self.dirty = true;
        Ok(())
    }

    /// Sets the pause inserted after each member of `queue`.
    pub fn set_queue_pause_secs(&mut self, queue: u8, seconds: u32) -> Result<()> {
        check((queue as usize) < QUEUES)?;
        check_range(seconds <= 0x7fff_ffff)?;
        self.queue_pause[queue as usize].set_seconds(seconds);
        self.dirty = true;
        Ok(())
    }

    /// Controls whether `queue` resumes by itself after its post-member
    /// pause or waits for a manual resume.
    pub fn set_queue_autoadvance(&mut self, queue: u8, en: bool) -> Result<()> {
        check((queue as usize) < QUEUES)?;
        self.queue_pause[queue as usize].set_autoadvance(en);
        self.dirty = true;
        Ok(())
    }

    /// Overrides the duration of `relay` when run by `queue`, in seconds;
    /// 0 falls back to the relay's default minutes.
    ///
    /// Row 31 is the per-relay pause table and cannot be written here; use
    /// [`set_relay_pause_secs`](Self::set_relay_pause_secs).
    pub fn set_queue_override_secs(&mut self, queue: u8, relay: u8, seconds: u16) -> Result<()> {
        check((queue as usize) < PAUSE_ROW && (relay as usize) < RELAYS)?;
        self.override_secs[queue as usize][relay as usize] = seconds;
        self.dirty = true;
        Ok(())
    }

    /// Sets how many extra cycles `queue` runs after its first one.
    pub fn set_queue_repeat(&mut self, queue: u8, times: u8) -> Result<()> {
        check((queue as usize) < QUEUES)?;
        self.queue_repeat[queue as usize] = times;
        self.dirty = true;
        Ok(())
    }

    /// Member bitset of `queue`.
    pub fn queue_members(&self, queue: u8) -> Result<u32> {
        check((queue as usize) < QUEUES)?;
        Ok(self.queue_members[queue as usize])
    }

    pub fn queue_pause_secs(&self, queue: u8) -> Result<u32> {
        check((queue as usize) < QUEUES)?;
        Ok(self.queue_pause[queue as usize].seconds())
    }

    pub fn queue_autoadvance(&self, queue: u8) -> Result<bool> {
        check((queue as usize) < QUEUES)?;
        Ok(self.queue_pause[queue as usize].autoadvance())
    }

    pub fn queue_override_secs(&self, queue: u8, relay: u8) -> Result<u16> {
        check((queue as usize) < PAUSE_ROW && (relay as usize) < RELAYS)?;
        Ok(self.override_secs[queue as usize][relay as usize])
    }

    pub fn queue_repeat(&self, queue: u8) -> Result<u8> {
        check((queue as usize) < QUEUES)?;
        Ok(self.queue_repeat[queue as usize])
    }

    // --- pumps ---

    /// Sets the global staging delay between commanding a pump on and
    /// opening the valves it feeds.
    pub fn set_pump_delay_ms(&mut self, ms: u32) {
        self.pump_delay_ms = ms;
        self.dirty = true;
    }

    pub fn set_pump_enabled(&mut self, pump: u8, en: bool) -> Result<()> {
        check((pump as usize) < PUMPS)?;
        self.pump.set_enabled(pump, en);
        self.dirty = true;
        Ok(())
    }

    /// Designates the relay that actuates `pump`. That relay must not be a
    /// member of any queue.
    pub fn set_pump_relay(&mut self, pump: u8, relay: u8) -> Result<()> {
        check((pump as usize) < PUMPS && (relay as usize) < RELAYS)?;
        self.pump.set_relay_id(pump, relay);
        self.dirty = true;
        Ok(())
    }

    pub fn pump_delay_ms(&self) -> u32 {
        self.pump_delay_ms
    }

    pub fn pump_enabled(&self, pump: u8) -> Result<bool> {
        check((pump as usize) < PUMPS)?;
        Ok(self.pump.enabled(pump))
    }

    pub fn pump_relay(&self, pump: u8) -> Result<u8> {
        check((pump as usize) < PUMPS)?;
        Ok(self.pump.relay_id(pump))
    }

    // --- per-relay pause ---

    /// Sets the pause applied after `relay` finishes in any queue,
    /// overriding that queue's own pause when nonzero.
    pub fn set_relay_pause_secs(&mut self, relay: u8, seconds: u32) -> Result<()> {
        check((relay as usize) < RELAYS)?;
        check_range(seconds <= u16::MAX as u32)?;
        self.override_secs[PAUSE_ROW][relay as usize] = seconds as u16;
        self.dirty = true;
        Ok(())
    }

    pub fn relay_pause_secs(&self, relay: u8) -> Result<u16> {
        check((relay as usize) < RELAYS)?;
        Ok(self.override_secs[PAUSE_ROW][relay as usize])
    }

    // --- runtime queries ---

    /// Bitset of queues currently executing.
    pub fn running_queues(&self) -> u32 {
        self.queue_running
    }

    /// Bitset of relays currently asserted, valve activations and pump
    /// actuators alike.
    pub fn running_relays(&self) -> u32 {
        self.relay_running
    }

    /// Bitset of pumps currently on.
    pub fn active_pumps(&self) -> u8 {
        self.active_pumps
    }

    /// True while an unsaved configuration change is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
