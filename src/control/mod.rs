//! Manual control surface: start, pause, resume and step queues.
//!
//! Pausing marks a queue; whether the mark blocks progress depends on the
//! queue's autoadvance bit (see the engine's pause gate). Stepping moves a
//! queue's cursor without touching the relay that is currently running;
//! the next tick acts on the new position.

#[cfg(test)]
mod test;

use crate::config::{SprinklerConfig, QUEUES};
use crate::error::{Error, Result};

fn check_queue(queue: u8) -> Result<()> {
    if (queue as usize) < QUEUES {
        Ok(())
    } else {
        Err(Error::Param)
    }
}

impl SprinklerConfig {
    /// Marks `queue` runnable; the next tick begins walking its members.
    /// Re-starting a queue that is already running changes nothing.
    pub fn queue_start(&mut self, queue: u8) -> Result<()> {
        check_queue(queue)?;
        self.queue_running |= 1 << queue;
        Ok(())
    }

    /// Withdraws `queue` from scheduling. Relays it left running are
    /// cleaned up by the next tick once no queue needs them.
    pub fn queue_stop(&mut self, queue: u8) -> Result<()> {
        check_queue(queue)?;
        self.queue_running &= !(1 << queue);
        Ok(())
    }

    /// Halts all scheduling; the next tick releases every relay and pump.
    pub fn queue_stop_all(&mut self) {
        self.queue_running = 0;
    }

    pub fn queue_pause_all(&mut self) {
        self.queue_paused = [true; QUEUES];
    }

    pub fn queue_resume_all(&mut self) {
        self.queue_paused = [false; QUEUES];
    }

    pub fn queue_pause(&mut self, queue: u8) -> Result<()> {
        check_queue(queue)?;
        self.queue_paused[queue as usize] = true;
        Ok(())
    }

    pub fn queue_resume(&mut self, queue: u8) -> Result<()> {
        check_queue(queue)?;
        self.queue_paused[queue as usize] = false;
        Ok(())
    }

    /// Moves `queue` one position forward.
    pub fn queue_next(&mut self, queue: u8) -> Result<()> {
        check_queue(queue)?;
        if self.current_idx[queue as usize] < 31 {
            self.current_idx[queue as usize] += 1;
        }
        Ok(())
    }

    /// Moves `queue` one position back.
    pub fn queue_previous(&mut self, queue: u8) -> Result<()> {
        check_queue(queue)?;
        if self.current_idx[queue as usize] > 0 {
            self.current_idx[queue as usize] -= 1;
        }
        Ok(())
    }

    /// Moves every running queue one position forward.
    pub fn queue_next_all(&mut self) {
        for q in 0..QUEUES {
            if self.queue_running & (1 << q) != 0 && self.current_idx[q] < 31 {
                self.current_idx[q] += 1;
            }
        }
    }

    /// Moves every running queue one position back.
    pub fn queue_previous_all(&mut self) {
        for q in 0..QUEUES {
            if self.queue_running & (1 << q) != 0 && self.current_idx[q] > 0 {
                self.current_idx[q] -= 1;
            }
        }
    }

    /// Bitset of paused queues.
    pub fn paused_queues(&self) -> u32 {
        let mut mask = 0;
        for (q, paused) in self.queue_paused.iter().enumerate() {
            if *paused {
                mask |= 1 << q;
            }
        }
        mask
    }

    pub fn is_queue_paused(&self, queue: u8) -> Result<bool> {
        check_queue(queue)?;
        Ok(self.queue_paused[queue as usize])
    }

    /// True if any queue is paused.
    pub fn any_queue_paused(&self) -> bool {
        self.queue_paused.iter().any(|p| *p)
    }
}
