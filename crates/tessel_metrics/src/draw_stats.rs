//! Per-frame batching statistics
//!
//! Fed by the sprite draw pass once per flush. Batch counts keep a rolling
//! history; sprite totals accumulate for the lifetime of the stats.

use super::counter::Counter;
use super::ring_buffer::RingBuffer;

const DRAWN: &str = "sprites_drawn";
const SKIPPED: &str = "sprites_skipped";

pub struct DrawStats {
    batches: RingBuffer<usize>,
    totals: Counter,
    frames: u64,
}

impl DrawStats {
    pub fn new(history: usize) -> Self {
        Self {
            batches: RingBuffer::new(history),
            totals: Counter::new(),
            frames: 0,
        }
    }

    pub fn record_frame(&mut self, batches: usize, drawn: usize, skipped: usize) {
        self.batches.push(batches);
        self.totals.increment(DRAWN, drawn);
        self.totals.increment(SKIPPED, skipped);
        self.frames += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Batch count of the most recent frame.
    pub fn last_batches(&self) -> usize {
        self.batches.latest().unwrap_or(0)
    }

    pub fn average_batches(&self) -> f64 {
        self.batches.average()
    }

    pub fn peak_batches(&self) -> usize {
        self.batches.peak()
    }

    pub fn sprites_drawn(&self) -> usize {
        self.totals.get(DRAWN)
    }

    pub fn sprites_skipped(&self) -> usize {
        self.totals.get(SKIPPED)
    }
}
