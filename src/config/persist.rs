//! Fixed-layout little-endian image of the persisted configuration.
//!
//! The image is the persisted fields of [`SprinklerConfig`] in struct
//! order, each word little-endian. There is no header and no checksum:
//! a wrong-sized or truncated image fails to decode and the init path
//! falls back to a zeroed configuration.

use arrayvec::ArrayVec;

#[cfg(feature = "minute-precision")]
use super::HOURS;
use super::{SprinklerConfig, MONTHS, QUEUES, RELAYS, SLOTS};
use crate::codec::{MonthByte, PauseWord, PumpWord, RelayWord, ScheduleWord};

#[cfg(feature = "minute-precision")]
const MINUTE_TABLE_LEN: usize = SLOTS * HOURS;
#[cfg(not(feature = "minute-precision"))]
const MINUTE_TABLE_LEN: usize = 0;

/// Exact byte length of the persisted image.
pub const PERSIST_LEN: usize = 4 // pump word
    + SLOTS * 4                  // schedule words
    + MINUTE_TABLE_LEN           // per-hour start minutes
    + SLOTS * 4                  // slot-to-queue bitsets
    + RELAYS * 2                 // relay words
    + RELAYS * 4                 // overlap milliseconds
    + MONTHS                     // month bytes
    + 4                          // pump staging delay
    + QUEUES * 4                 // queue member bitsets
    + QUEUES                     // repeat counts
    + QUEUES * RELAYS * 2        // override / pause seconds
    + QUEUES * 4                 // queue pause words
    + RELAYS;                    // relay GPIO map

// Walks a borrowed image, yielding one little-endian word at a time.
struct Cursor<'a> {
    buf: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let (head, rest) = self.buf.split_first_chunk::<N>()?;
        self.buf = rest;
        Some(*head)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|b| b[0])
    }

    fn u16(&mut self) -> Option<u16> {
        self.take::<2>().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Option<u32> {
        self.take::<4>().map(u32::from_le_bytes)
    }
}

impl SprinklerConfig {
    /// Serializes the persisted portion of the configuration.
    pub fn encode(&self) -> ArrayVec<u8, PERSIST_LEN> {
        let mut out = ArrayVec::new();

        out.extend(self.pump.0.to_le_bytes());
        for word in &self.schedule {
            out.extend(word.0.to_le_bytes());
        }
        #[cfg(feature = "minute-precision")]
        for row in &self.schedule_minute {
            out.extend(row.iter().copied());
        }
        for queues in &self.schedule_queues {
            out.extend(queues.to_le_bytes());
        }
        for word in &self.relay {
            out.extend(word.0.to_le_bytes());
        }
        for ms in &self.relay_overlap_ms {
            out.extend(ms.to_le_bytes());
        }
        for byte in &self.month {
            out.push(byte.0);
        }
        out.extend(self.pump_delay_ms.to_le_bytes());
        for members in &self.queue_members {
            out.extend(members.to_le_bytes());
        }
        out.extend(self.queue_repeat.iter().copied());
        for row in &self.override_secs {
            for secs in row {
                out.extend(secs.to_le_bytes());
            }
        }
        for word in &self.queue_pause {
            out.extend(word.0.to_le_bytes());
        }
        out.extend(self.relay_gpio.iter().copied());

        debug_assert_eq!(out.len(), PERSIST_LEN);
        out
    }

    /// Rebuilds a configuration from a stored image. Runtime state comes
    /// back zeroed. Returns `None` unless `bytes` is exactly one image.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != PERSIST_LEN {
            return None;
        }
        let mut cur = Cursor { buf: bytes };
        let mut cfg = Self::default();

        cfg.pump = PumpWord(cur.u32()?);
        for word in &mut cfg.schedule {
            *word = ScheduleWord(cur.u32()?);
        }
        #[cfg(feature = "minute-precision")]
        for row in &mut cfg.schedule_minute {
            for minute in row {
                *minute = cur.u8()?;
            }
        }
        for queues in &mut cfg.schedule_queues {
            *queues = cur.u32()?;
        }
        for word in &mut cfg.relay {
            *word = RelayWord(cur.u16()?);
        }
        for ms in &mut cfg.relay_overlap_ms {
            *ms = cur.u32()?;
        }
        for byte in &mut cfg.month {
            *byte = MonthByte(cur.u8()?);
        }
        cfg.pump_delay_ms = cur.u32()?;
        for members in &mut cfg.queue_members {
            *members = cur.u32()?;
        }
        for repeat in &mut cfg.queue_repeat {
            *repeat = cur.u8()?;
        }
        for row in &mut cfg.override_secs {
            for secs in row {
                *secs = cur.u16()?;
            }
        }
        for word in &mut cfg.queue_pause {
            *word = PauseWord(cur.u32()?);
        }
        for gpio in &mut cfg.relay_gpio {
            *gpio = cur.u8()?;
        }

        Some(cfg)
    }
}
