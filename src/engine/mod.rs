//! The scheduling engine: one cooperative, non-blocking tick.
//!
//! Each tick samples the clock once and then runs five ordered phases:
//! calendar ingest, persistence flush, deferred pump starts, the idle
//! shortcut, and the queue walk. All deadlines are absolute epoch seconds
//! compared with wrap-safe signed subtraction, so the 2³²-second rollover
//! is harmless.
//!
//! Hardware faults inside the tick are logged and swallowed; stops are
//! re-attempted on later ticks as the state machine converges. The tick's
//! own error return is reserved for a failing clock source, in which case
//! no state is advanced.


use log::{debug, info, warn};

use crate::calendar;
use crate::config::persist::PERSIST_LEN;
use crate::config::{SprinklerConfig, PAUSE_ROW, PERSIST_PERIOD_SECS, PUMPS, QUEUES, RELAYS};
use crate::error::{Error, Result};
use crate::host::{Clock, Hardware, Storage};

fn before(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) < 0
}

fn after_eq(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) >= 0
}

fn start_gpio(hw: &mut impl Hardware, gpio: u8) {
    if hw.start_relay(gpio).is_err() {
        warn!("start_relay({gpio}) failed");
    }
}

fn stop_gpio(hw: &mut impl Hardware, gpio: u8) {
    if hw.stop_relay(gpio).is_err() {
        warn!("stop_relay({gpio}) failed");
    }
}

/// Effective duration of `relay` when run by `queue`, in seconds.
///
/// The queue override wins when nonzero, otherwise the relay's default
/// minutes apply. The reserved pause row never supplies durations, so a
/// walk of queue 31 falls back to relay defaults.
fn member_duration(cfg: &SprinklerConfig, queue: usize, relay: usize) -> u32 {
    let over = if queue == PAUSE_ROW {
        0
    } else {
        cfg.override_secs[queue][relay]
    };
    if over != 0 {
        over as u32
    } else {
        cfg.relay[relay].minutes() as u32 * 60
    }
}

/// Whether `relay` is currently asserted as the actuator of an active pump.
fn is_active_actuator(cfg: &SprinklerConfig, relay: usize) -> bool {
    (0..PUMPS as u8).any(|p| cfg.active_pumps & 1 << p != 0 && cfg.pump.relay_id(p) as usize == relay)
}

fn start_actuator(cfg: &mut SprinklerConfig, hw: &mut impl Hardware, pump: u8) {
    let actuator = cfg.pump.relay_id(pump) as usize;
    start_gpio(hw, cfg.relay_gpio[actuator]);
    cfg.active_pumps |= 1 << pump;
    cfg.relay_running |= 1 << actuator;
    debug!("pump {pump} on via actuator relay {actuator}");
}

/// Makes sure `pump` is running before a dependent valve opens.
///
/// Returns `true` when the valve may start now: no pump is required, or
/// the pump is already on, or it could be switched on immediately. Returns
/// `false` while the staging delay is still counting down; the caller
/// retries on a later tick.
fn ensure_pump(cfg: &mut SprinklerConfig, hw: &mut impl Hardware, pump: u8, now: u32) -> bool {
    if pump as usize >= PUMPS || !cfg.pump.enabled(pump) {
        return true;
    }
    if cfg.active_pumps & 1 << pump != 0 {
        return true;
    }
    let pi = pump as usize;
    if cfg.pump_start[pi] != 0 {
        if after_eq(now, cfg.pump_start[pi]) {
            start_actuator(cfg, hw, pump);
            cfg.pump_start[pi] = 0;
            return true;
        }
        return false;
    }
    if cfg.pump_delay_ms == 0 {
        start_actuator(cfg, hw, pump);
        return true;
    }
    cfg.pump_start[pi] = now.wrapping_add(cfg.pump_delay_ms.div_ceil(1000));
    false
}

/// Stops `pump` unless some running valve still draws from it. Actuators
/// of active pumps are not valves and do not keep a pump alive.
fn release_pump(cfg: &mut SprinklerConfig, hw: &mut impl Hardware, pump: u8) {
    if pump as usize >= PUMPS || cfg.active_pumps & 1 << pump == 0 {
        return;
    }
    for r in 0..RELAYS {
        if cfg.relay_running & 1 << r == 0 || is_active_actuator(cfg, r) {
            continue;
        }
        if cfg.relay[r].pump_id() == pump {
            return;
        }
    }
    let actuator = cfg.pump.relay_id(pump) as usize;
    stop_gpio(hw, cfg.relay_gpio[actuator]);
    cfg.relay_running &= !(1 << actuator);
    cfg.active_pumps &= !(1 << pump);
    debug!("pump {pump} off");
}

/// A queue walked past its last member: either grant another cycle or
/// retire it. A configured repeat of `k` yields exactly `k + 1` cycles;
/// 0 means a single cycle.
fn end_of_cycle(cfg: &mut SprinklerConfig, queue: usize) {
    let limit = cfg.queue_repeat[queue];
    if limit == 0 || cfg.repeat_count[queue] as u16 + 1 > limit as u16 {
        cfg.queue_running &= !(1 << queue);
        cfg.repeat_count[queue] = 0;
        info!("queue {queue} finished");
    } else {
        cfg.repeat_count[queue] += 1;
        debug!("queue {queue} repeats, cycle {}", cfg.repeat_count[queue] + 1);
    }
    cfg.current_idx[queue] = 0;
}

/// The controller: the configuration aggregate plus the three host
/// gateways it exclusively owns between init and teardown.
///
/// # Examples
///
/// ```rust
/// use sprinkler_engine::engine::Controller;
/// use sprinkler_engine::host::generic::{ManualClock, MemStore, SimRelays};
///
/// let mut ctl = Controller::new(SimRelays::new(), ManualClock::at(100), MemStore::new());
///
/// let cfg = ctl.config_mut();
/// cfg.set_relay_enabled(0, true).unwrap();
/// cfg.set_relay_gpio(0, 4).unwrap();
/// cfg.set_queue_member(0, 0, true).unwrap();
/// cfg.set_queue_override_secs(0, 0, 10).unwrap();
/// cfg.set_queue_autoadvance(0, true).unwrap();
/// cfg.queue_start(0).unwrap();
///
/// ctl.tick().unwrap();
/// assert_eq!(ctl.config().running_relays(), 1);
/// assert!(ctl.hardware().is_on(4));
///
/// ctl.clock_mut().advance(11);
/// ctl.tick().unwrap();
/// ctl.tick().unwrap();
/// assert_eq!(ctl.config().running_queues(), 0);
/// assert!(!ctl.hardware().is_on(4));
/// ```
pub struct Controller<H, C, S> {
    cfg: SprinklerConfig,
    hw: H,
    clock: C,
    storage: S,
}

impl<H: Hardware, C: Clock, S: Storage> Controller<H, C, S> {
    /// Builds a controller, loading the persisted configuration or falling
    /// back to a zeroed one when the storage gateway cannot deliver an
    /// intact image.
    pub fn new(hw: H, clock: C, mut storage: S) -> Self {
        let mut image = [0u8; PERSIST_LEN];
        let cfg = match storage.load(&mut image) {
            Ok(()) => SprinklerConfig::decode(&image).unwrap_or_default(),
            Err(_) => {
                info!("no stored configuration, starting zeroed");
                SprinklerConfig::default()
            }
        };
        Self {
            cfg,
            hw,
            clock,
            storage,
        }
    }

    pub fn config(&self) -> &SprinklerConfig {
        &self.cfg
    }

    pub fn config_mut(&mut self) -> &mut SprinklerConfig {
        &mut self.cfg
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Tears the controller down, flushing unsaved configuration with up
    /// to three store attempts.
    pub fn shutdown(mut self) -> Result<()> {
        if !self.cfg.dirty {
            return Ok(());
        }
        let image = self.cfg.encode();
        for attempt in 0..3 {
            if self.storage.store(&image).is_ok() {
                return Ok(());
            }
            warn!("teardown store attempt {} failed", attempt + 1);
        }
        Err(Error::Storage)
    }

    /// One scheduling step. Non-blocking; call repeatedly from the host's
    /// main loop. Errors only when the clock source fails, leaving all
    /// state untouched for the next attempt.
    pub fn tick(&mut self) -> Result<()> {
        let (t, now) = self.clock.now().map_err(|_| Error::Fail)?;
        let cfg = &mut self.cfg;
        let hw = &mut self.hw;

        // Calendar ingest: fire each matching instant exactly once.
        let slot = calendar::matching_slot(cfg, &t);
        #[cfg(feature = "minute-precision")]
        let fresh_instant = cfg.last_trigger_minute != Some(t.minute);
        #[cfg(not(feature = "minute-precision"))]
        let fresh_instant = cfg.last_trigger_hour != Some(t.hour);
        if fresh_instant {
            if let Some(sid) = slot {
                let queues = cfg.schedule_queues[sid as usize];
                cfg.queue_running |= queues;
                info!("slot {sid} fired, queues {queues:#010x} scheduled");
            }
        }
        #[cfg(feature = "minute-precision")]
        {
            cfg.last_trigger_minute = Some(t.minute);
        }
        #[cfg(not(feature = "minute-precision"))]
        {
            cfg.last_trigger_hour = Some(t.hour);
        }

        // Periodic persistence flush.
        if cfg.dirty && after_eq(now, cfg.last_persist.wrapping_add(PERSIST_PERIOD_SECS)) {
            if self.storage.store(&cfg.encode()).is_ok() {
                cfg.dirty = false;
                cfg.last_persist = now;
            } else {
                warn!("periodic config store failed, retrying next window");
            }
        }

        // Pumps whose staging delay has elapsed.
        for p in 0..PUMPS {
            if cfg.pump_start[p] != 0 && after_eq(now, cfg.pump_start[p]) {
                cfg.pump_start[p] = 0;
                start_actuator(cfg, hw, p as u8);
            }
        }

        // Idle: release everything and reset the runtime state.
        if cfg.queue_running == 0 {
            if cfg.relay_running != 0 {
                for r in 0..RELAYS {
                    if cfg.relay_running & 1 << r != 0 {
                        stop_gpio(hw, cfg.relay_gpio[r]);
                    }
                }
                cfg.relay_running = 0;
            }
            cfg.current_idx = [0; QUEUES];
            cfg.pause_end = [0; QUEUES];
            cfg.queue_paused = [false; QUEUES];
            cfg.repeat_count = [0; QUEUES];
            cfg.relay_end = [[0; RELAYS]; QUEUES];
            cfg.active_pumps = 0;
            cfg.pump_start = [0; PUMPS];
            return Ok(());
        }

        // Walk every running queue.
        for q in 0..QUEUES {
            if cfg.queue_running & 1 << q == 0 {
                continue;
            }
            let members = cfg.queue_members[q];
            if members == 0 {
                cfg.queue_running &= !(1 << q);
                cfg.repeat_count[q] = 0;
                continue;
            }

            let mut idx = cfg.current_idx[q] as usize;
            while idx < RELAYS && members & 1 << idx == 0 {
                idx += 1;
            }
            if idx >= RELAYS {
                end_of_cycle(cfg, q);
                continue;
            }
            cfg.current_idx[q] = idx as u8;
            let r = idx;

            // Pause gate: timer pause first, then the manual flag, which
            // autoadvance bypasses.
            if cfg.pause_end[q] != 0 {
                if before(now, cfg.pause_end[q]) {
                    continue;
                }
                cfg.pause_end[q] = 0;
            }
            if cfg.queue_paused[q] && !cfg.queue_pause[q].autoadvance() {
                continue;
            }

            if !cfg.relay[r].enabled() {
                cfg.current_idx[q] += 1;
                continue;
            }

            let dur = member_duration(cfg, q, r);
            if dur == 0 {
                cfg.current_idx[q] += 1;
                continue;
            }

            // Activation, once the pump (if any) is up.
            if cfg.relay_end[q][r] == 0 {
                let pump = cfg.relay[r].pump_id();
                if !ensure_pump(cfg, hw, pump, now) {
                    continue;
                }
                cfg.relay_end[q][r] = now.wrapping_add(dur);
                if cfg.relay_running & 1 << r == 0 {
                    start_gpio(hw, cfg.relay_gpio[r]);
                    cfg.relay_running |= 1 << r;
                    debug!("queue {q}: relay {r} on for {dur} s");
                }
            }

            // Expiry.
            if after_eq(now, cfg.relay_end[q][r]) {
                let needed_elsewhere = (0..QUEUES).any(|o| {
                    o != q
                        && cfg.queue_running & 1 << o != 0
                        && cfg.current_idx[o] as usize == r
                        && cfg.relay_end[o][r] != 0
                        && before(now, cfg.relay_end[o][r])
                });
                if !needed_elsewhere && cfg.relay_running & 1 << r != 0 {
                    stop_gpio(hw, cfg.relay_gpio[r]);
                    cfg.relay_running &= !(1 << r);
                    debug!("queue {q}: relay {r} off");
                }
                let pump = cfg.relay[r].pump_id();
                release_pump(cfg, hw, pump);
                cfg.relay_end[q][r] = 0;

                let per_relay = cfg.override_secs[PAUSE_ROW][r] as u32;
                let pause = if per_relay != 0 {
                    per_relay
                } else {
                    cfg.queue_pause[q].seconds()
                };
                if pause > 0 {
                    cfg.pause_end[q] = now.wrapping_add(pause);
                }
                if !cfg.queue_pause[q].autoadvance() {
                    cfg.queue_paused[q] = true;
                }

                cfg.current_idx[q] += 1;
                let mut next = cfg.current_idx[q] as usize;
                while next < RELAYS && members & 1 << next == 0 {
                    next += 1;
                }
                if next >= RELAYS {
                    end_of_cycle(cfg, q);
                }
            }

            // Overlap: while this activation is live and inside its overlap
            // window, pre-start the next enabled member so pressure holds
            // across the transition. The cursor does not move; the normal
            // advance picks the successor up after expiry.
            let overlap_ms = cfg.relay_overlap_ms[r];
            if overlap_ms > 0 && cfg.relay_end[q][r] != 0 && cfg.relay_running & 1 << r != 0 {
                let intended_start = cfg.relay_end[q][r].wrapping_sub(overlap_ms.div_ceil(1000));
                if after_eq(now, intended_start) {
                    let mut next = r + 1;
                    while next < RELAYS && (members & 1 << next == 0 || !cfg.relay[next].enabled()) {
                        next += 1;
                    }
                    if next < RELAYS && cfg.relay_end[q][next] == 0 {
                        let dur_next = member_duration(cfg, q, next);
                        let pump_next = cfg.relay[next].pump_id();
                        if dur_next != 0 && ensure_pump(cfg, hw, pump_next, now) {
                            cfg.relay_end[q][next] = intended_start.wrapping_add(dur_next);
                            if cfg.relay_running & 1 << next == 0 {
                                start_gpio(hw, cfg.relay_gpio[next]);
                                cfg.relay_running |= 1 << next;
                                debug!("queue {q}: relay {next} on, overlapping relay {r}");
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
