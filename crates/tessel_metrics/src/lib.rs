//! Tessel Metrics - draw statistics for the sprite pipeline
//!
//! Provides zero-cost abstractions for metrics collection that completely
//! vanish in production builds via feature flags.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use tessel_metrics::DrawStats;
//!
//! let mut stats = DrawStats::new(120); // Keep the last 120 frames
//! stats.record_frame(batches, drawn, skipped);
//! println!("avg batches: {:.1}", stats.average_batches());
//! ```
//!
//! Without the `metrics` feature every type is an empty stub.

#[cfg(feature = "metrics")]
mod counter;
#[cfg(feature = "metrics")]
mod draw_stats;
#[cfg(feature = "metrics")]
mod frame_timer;
#[cfg(feature = "metrics")]
mod ring_buffer;

#[cfg(feature = "metrics")]
pub use counter::Counter;
#[cfg(feature = "metrics")]
pub use draw_stats::DrawStats;
#[cfg(feature = "metrics")]
pub use frame_timer::FrameTimer;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;

// ============================================================================
// Macros for conditional compilation
// ============================================================================

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
pub struct FrameTimer;

#[cfg(not(feature = "metrics"))]
impl FrameTimer {
    pub fn new(_capacity: usize) -> Self { Self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) {}
    pub fn record(&mut self, _elapsed: std::time::Duration) {}
    pub fn frames(&self) -> u64 { 0 }
    pub fn fps(&self) -> f64 { 0.0 }
    pub fn frame_time_ms(&self) -> f64 { 0.0 }
    pub fn worst_frame_ms(&self) -> f64 { 0.0 }
}

#[cfg(not(feature = "metrics"))]
pub struct RingBuffer<T>(std::marker::PhantomData<T>);

#[cfg(not(feature = "metrics"))]
impl<T> RingBuffer<T> {
    pub fn new(_capacity: usize) -> Self { Self(std::marker::PhantomData) }
    pub fn push(&mut self, _value: T) {}
    pub fn len(&self) -> usize { 0 }
    pub fn is_empty(&self) -> bool { true }
}

#[cfg(not(feature = "metrics"))]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    pub fn increment(&mut self, _name: &'static str, _value: usize) {}
    pub fn set(&mut self, _name: &'static str, _value: usize) {}
    pub fn get(&self, _name: &str) -> usize { 0 }
}

#[cfg(not(feature = "metrics"))]
impl Default for Counter {
    fn default() -> Self { Self }
}

#[cfg(not(feature = "metrics"))]
pub struct DrawStats;

#[cfg(not(feature = "metrics"))]
impl DrawStats {
    pub fn new(_history: usize) -> Self { Self }
    pub fn record_frame(&mut self, _batches: usize, _drawn: usize, _skipped: usize) {}
    pub fn frames(&self) -> u64 { 0 }
    pub fn last_batches(&self) -> usize { 0 }
    pub fn average_batches(&self) -> f64 { 0.0 }
    pub fn peak_batches(&self) -> usize { 0 }
    pub fn sprites_drawn(&self) -> usize { 0 }
    pub fn sprites_skipped(&self) -> usize { 0 }
}
