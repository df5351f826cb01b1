//! Gateways the host firmware provides: relay hardware, wall clock and
//! non-volatile storage.
//!
//! The engine drives these through narrow traits so it can run unmodified
//! on real GPIO banks, RTOS ports or the simulated bank in [`generic`].

pub mod generic;
#[cfg(test)]
mod test;

use crate::error::Result;

/// Broken-down local wall-clock time as sampled by a [`Clock`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalTime {
    /// Absolute year, e.g. 2026.
    pub year: u16,
    /// 0 = January .. 11 = December.
    pub month: u8,
    /// 0 = Sunday .. 6 = Saturday, the C `tm_wday` convention. The calendar
    /// matcher converts this to its Monday-based weekday internally.
    pub weekday: u8,
    /// 0..24.
    pub hour: u8,
    /// 0..60.
    pub minute: u8,
    /// 0..60.
    pub second: u8,
}

/// Relay bank driver.
///
/// Start and stop are idempotent per GPIO: asserting an already-asserted
/// line (or releasing a released one) is a no-op that still returns `Ok`.
/// The wait primitives block cooperatively and exist for host-level
/// sequencing only; the engine never calls them from inside a tick.
pub trait Hardware {
    fn start_relay(&mut self, gpio: u8) -> Result<()>;
    fn stop_relay(&mut self, gpio: u8) -> Result<()>;
    fn wait_ms(&mut self, ms: u32) -> Result<()>;
    fn wait_s(&mut self, s: u32) -> Result<()>;
}

/// Wall-clock source.
pub trait Clock {
    /// Samples the clock once: broken-down local time plus epoch seconds.
    ///
    /// The epoch value only ever feeds wrap-safe signed comparisons, so it
    /// may roll over at 2³² seconds without breaking the engine.
    fn now(&mut self) -> Result<(LocalTime, u32)>;
}

/// Non-volatile store for the persisted configuration image.
///
/// `buf` always has length [`PERSIST_LEN`](crate::config::persist::PERSIST_LEN);
/// anything else stored is the gateway's own concern (the image carries no
/// header or checksum, so a corrupt medium simply fails to load).
pub trait Storage {
    /// Fills `buf` with the most recently stored image.
    fn load(&mut self, buf: &mut [u8]) -> Result<()>;
    /// Durably replaces the stored image with `buf`.
    fn store(&mut self, buf: &[u8]) -> Result<()>;
}
