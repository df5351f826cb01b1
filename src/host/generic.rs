//! Generic ports: a simulated relay bank, a `libc`-backed system clock, a
//! manually-driven clock and file/memory storage gateways.
//!
//! These are enough to run the controller on any hosted platform and to
//! drive it deterministically from tests. Embedded hosts supply their own
//! [`Hardware`] and [`Storage`] implementations instead.

use std::fs;
use std::mem::MaybeUninit;
use std::path::PathBuf;
use std::ptr;
use std::thread;
use std::time::Duration;

use log::debug;

use super::{Clock, Hardware, LocalTime, Storage};
use crate::error::{Error, Result};

/// In-memory relay bank that tracks pin levels and transition counts.
///
/// Start and stop are idempotent: only level transitions are counted, so
/// the counters directly witness how often a line was physically toggled.
pub struct SimRelays {
    on: [bool; 256],
    starts: [u32; 256],
    stops: [u32; 256],
}

impl SimRelays {
    pub fn new() -> Self {
        Self {
            on: [false; 256],
            starts: [0; 256],
            stops: [0; 256],
        }
    }

    /// Current level of `gpio`.
    pub fn is_on(&self, gpio: u8) -> bool {
        self.on[gpio as usize]
    }

    /// Number of off-to-on transitions seen on `gpio`.
    pub fn starts(&self, gpio: u8) -> u32 {
        self.starts[gpio as usize]
    }

    /// Number of on-to-off transitions seen on `gpio`.
    pub fn stops(&self, gpio: u8) -> u32 {
        self.stops[gpio as usize]
    }
}

impl Default for SimRelays {
    fn default() -> Self {
        Self::new()
    }
}

impl Hardware for SimRelays {
    fn start_relay(&mut self, gpio: u8) -> Result<()> {
        let pin = gpio as usize;
        if !self.on[pin] {
            self.on[pin] = true;
            self.starts[pin] += 1;
            debug!("gpio {gpio} asserted");
        }
        Ok(())
    }

    fn stop_relay(&mut self, gpio: u8) -> Result<()> {
        let pin = gpio as usize;
        if self.on[pin] {
            self.on[pin] = false;
            self.stops[pin] += 1;
            debug!("gpio {gpio} released");
        }
        Ok(())
    }

    fn wait_ms(&mut self, ms: u32) -> Result<()> {
        thread::sleep(Duration::from_millis(ms as u64));
        Ok(())
    }

    fn wait_s(&mut self, s: u32) -> Result<()> {
        thread::sleep(Duration::from_secs(s as u64));
        Ok(())
    }
}

/// System wall clock via `libc::time` and `libc::localtime_r`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&mut self) -> Result<(LocalTime, u32)> {
        let epoch = unsafe { libc::time(ptr::null_mut()) };
        let mut tm = MaybeUninit::<libc::tm>::uninit();
        if unsafe { libc::localtime_r(&epoch, tm.as_mut_ptr()) }.is_null() {
            return Err(Error::Fail);
        }
        let tm = unsafe { tm.assume_init() };
        let local = LocalTime {
            year: (tm.tm_year + 1900) as u16,
            month: tm.tm_mon as u8,
            weekday: tm.tm_wday as u8,
            hour: tm.tm_hour as u8,
            minute: tm.tm_min as u8,
            second: tm.tm_sec as u8,
        };
        Ok((local, epoch as u32))
    }
}

/// Clock the host steps by hand. Reports `time` and `epoch` exactly as
/// set; advancing the epoch does not recompute the broken-down fields.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManualClock {
    pub time: LocalTime,
    pub epoch: u32,
}

impl ManualClock {
    pub fn at(epoch: u32) -> Self {
        Self {
            time: LocalTime::default(),
            epoch,
        }
    }

    pub fn advance(&mut self, seconds: u32) {
        self.epoch = self.epoch.wrapping_add(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&mut self) -> Result<(LocalTime, u32)> {
        Ok((self.time, self.epoch))
    }
}

/// Configuration image persisted as a plain file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Storage for FileStore {
    fn load(&mut self, buf: &mut [u8]) -> Result<()> {
        let image = fs::read(&self.path).map_err(|_| Error::Storage)?;
        if image.len() != buf.len() {
            return Err(Error::Storage);
        }
        buf.copy_from_slice(&image);
        Ok(())
    }

    fn store(&mut self, buf: &[u8]) -> Result<()> {
        fs::write(&self.path, buf).map_err(|_| Error::Storage)
    }
}

/// Volatile storage gateway. Loads fail until something has been stored;
/// useful for tests and for hosts without non-volatile memory.
#[derive(Clone, Debug, Default)]
pub struct MemStore {
    image: Option<Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last stored image, if any.
    pub fn image(&self) -> Option<&[u8]> {
        self.image.as_deref()
    }
}

impl Storage for MemStore {
    fn load(&mut self, buf: &mut [u8]) -> Result<()> {
        match &self.image {
            Some(image) if image.len() == buf.len() => {
                buf.copy_from_slice(image);
                Ok(())
            }
            _ => Err(Error::Storage),
        }
    }

    fn store(&mut self, buf: &[u8]) -> Result<()> {
        self.image = Some(buf.to_vec());
        Ok(())
    }
}
