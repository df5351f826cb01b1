//! Tick-driven irrigation controller for relay banks and supply pumps.
//!
//! The crate schedules up to 32 valve relays across up to 32 ordered
//! queues, fed by up to 5 staged supply pumps, according to a persisted
//! calendar of weekday/hour (and optionally minute) slots. The host
//! firmware supplies three narrow gateways — GPIO toggling, a wall clock
//! and non-volatile storage — and calls [`Controller::tick`] from its
//! cooperative main loop; the tick never blocks.
//!
//! ## Example
//!
//! Run a two-relay queue against the simulated host ports:
//!
//! ```rust
//! use sprinkler_engine::engine::Controller;
//! use sprinkler_engine::host::generic::{ManualClock, MemStore, SimRelays};
//!
//! let mut ctl = Controller::new(SimRelays::new(), ManualClock::at(1_000), MemStore::new());
//!
//! let cfg = ctl.config_mut();
//! for relay in [0, 1] {
//!     cfg.set_relay_enabled(relay, true).unwrap();
//!     cfg.set_relay_gpio(relay, 10 + relay).unwrap();
//!     cfg.set_queue_member(0, relay, true).unwrap();
//!     cfg.set_queue_override_secs(0, relay, 60).unwrap();
//! }
//! cfg.set_queue_autoadvance(0, true).unwrap();
//! cfg.queue_start(0).unwrap();
//!
//! ctl.tick().unwrap();
//! assert!(ctl.hardware().is_on(10)); // first member watering
//! assert!(!ctl.hardware().is_on(11));
//!
//! ctl.clock_mut().advance(61);
//! ctl.tick().unwrap();
//! ctl.tick().unwrap();
//! assert!(!ctl.hardware().is_on(10)); // first member done
//! assert!(ctl.hardware().is_on(11)); // second member watering
//! ```
//!
//! Calendar starts work the same way without manual intervention: enable a
//! month, point it at a schedule slot, set the slot's weekday/hour bits and
//! map the slot to one or more queues; the tick then ORs those queues into
//! the running set at the scheduled instant.
//!
//! ## Features
//!
//! - `minute-precision` (default): schedule slots carry a start minute per
//!   enabled hour; without the feature they fire on the hour boundary.
//! - `serde`: `Serialize`/`Deserialize` on the packed record words and
//!   [`host::LocalTime`].

mod calendar;
pub mod codec;
pub mod config;
mod control;
pub mod engine;
mod error;
pub mod host;

pub use error::{Error, Result};
