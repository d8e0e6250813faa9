//! Memory pressure port used by the crawl dispatcher

/// Reports resident memory usage so dispatchers can throttle
pub trait MemoryPressure: Send + Sync {
    /// Used memory as a percentage of total (0.0 - 100.0)
    fn used_percent(&self) -> f32;
}
