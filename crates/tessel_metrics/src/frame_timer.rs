//! Wall-clock frame timing for the demo loop

use super::ring_buffer::RingBuffer;
use std::time::{Duration, Instant};

pub struct FrameTimer {
    started: Option<Instant>,
    history: RingBuffer<Duration>,
    worst: Duration,
    frames: u64,
}

impl FrameTimer {
    /// Keep the last `capacity` frame durations.
    pub fn new(capacity: usize) -> Self {
        Self {
            started: None,
            history: RingBuffer::new(capacity),
            worst: Duration::ZERO,
            frames: 0,
        }
    }

    pub fn begin(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Close the frame opened by `begin`. Ignored without one.
    pub fn end(&mut self) {
        let Some(started) = self.started.take() else {
            return;
        };
        self.record(started.elapsed());
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.history.push(elapsed);
        self.worst = self.worst.max(elapsed);
        self.frames += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn fps(&self) -> f64 {
        let secs = self.history.average().as_secs_f64();
        if secs > 0.0 { 1.0 / secs } else { 0.0 }
    }

    /// Average over the kept history.
    pub fn frame_time_ms(&self) -> f64 {
        self.history.average().as_secs_f64() * 1000.0
    }

    /// Slowest frame since creation.
    pub fn worst_frame_ms(&self) -> f64 {
        self.worst.as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_average_and_worst() {
        let mut timer = FrameTimer::new(2);
        timer.record(Duration::from_millis(40));
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.frames(), 3);
        assert!((timer.frame_time_ms() - 20.0).abs() < 1e-9);
        assert!((timer.worst_frame_ms() - 40.0).abs() < 1e-9);
        assert!((timer.fps() - 50.0).abs() < 1e-6);
    }

    #[test]
    fn end_without_begin_is_ignored() {
        let mut timer = FrameTimer::new(4);
        timer.end();
        assert_eq!(timer.frames(), 0);
        assert_eq!(timer.fps(), 0.0);
    }
}
