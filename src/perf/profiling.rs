/// Pipeline instrumentation.
/// Call counters compile to nothing unless the `profiling` feature is enabled.
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for pipeline stages
pub struct FunctionCounters {
    // Draw submission
    pub draw_calls: AtomicU64,
    pub triangles_submitted: AtomicU64,
    pub primitives_dropped: AtomicU64,

    // Clipping
    pub triangles_clipped: AtomicU64,
    pub triangles_rejected: AtomicU64,

    // Rasterization
    pub triangles_rasterized: AtomicU64,
    pub triangles_degenerate: AtomicU64,
    pub scanlines_drawn: AtomicU64,
    pub scanlines_skipped: AtomicU64,
    pub pixels_written: AtomicU64,

    // Targets
    pub target_clear_calls: AtomicU64,
}

impl FunctionCounters {
    pub const fn new() -> Self {
        Self {
            draw_calls: AtomicU64::new(0),
            triangles_submitted: AtomicU64::new(0),
            primitives_dropped: AtomicU64::new(0),
            triangles_clipped: AtomicU64::new(0),
            triangles_rejected: AtomicU64::new(0),
            triangles_rasterized: AtomicU64::new(0),
            triangles_degenerate: AtomicU64::new(0),
            scanlines_drawn: AtomicU64::new(0),
            scanlines_skipped: AtomicU64::new(0),
            pixels_written: AtomicU64::new(0),
            target_clear_calls: AtomicU64::new(0),
        }
    }

    fn all(&self) -> [&AtomicU64; 11] {
        [
            &self.draw_calls,
            &self.triangles_submitted,
            &self.primitives_dropped,
            &self.triangles_clipped,
            &self.triangles_rejected,
            &self.triangles_rasterized,
            &self.triangles_degenerate,
            &self.scanlines_drawn,
            &self.scanlines_skipped,
            &self.pixels_written,
            &self.target_clear_calls,
        ]
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        for counter in self.all() {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> CounterSnapshot {
        let [
            draw_calls,
            triangles_submitted,
            primitives_dropped,
            triangles_clipped,
            triangles_rejected,
            triangles_rasterized,
            triangles_degenerate,
            scanlines_drawn,
            scanlines_skipped,
            pixels_written,
            target_clear_calls,
        ] = self.all().map(|c| c.load(Ordering::Relaxed));
        CounterSnapshot {
            draw_calls,
            triangles_submitted,
            primitives_dropped,
            triangles_clipped,
            triangles_rejected,
            triangles_rasterized,
            triangles_degenerate,
            scanlines_drawn,
            scanlines_skipped,
            pixels_written,
            target_clear_calls,
        }
    }
}

impl Default for FunctionCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of counter values at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub draw_calls: u64,
    pub triangles_submitted: u64,
    pub primitives_dropped: u64,
    pub triangles_clipped: u64,
    pub triangles_rejected: u64,
    pub triangles_rasterized: u64,
    pub triangles_degenerate: u64,
    pub scanlines_drawn: u64,
    pub scanlines_skipped: u64,
    pub pixels_written: u64,
    pub target_clear_calls: u64,
}

impl CounterSnapshot {
    /// Log the formatted report at info level
    pub fn log_report(&self) {
        log::info!("{}", self);
    }
}

impl fmt::Display for CounterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Pipeline Counters ===")?;
        writeln!(f, "Submission:")?;
        writeln!(f, "  draw calls:                 {:12}", self.draw_calls)?;
        writeln!(f, "  triangles submitted:        {:12}", self.triangles_submitted)?;
        writeln!(f, "  primitives dropped:         {:12}", self.primitives_dropped)?;

        writeln!(f, "Clipping:")?;
        writeln!(f, "  triangles clipped:          {:12}", self.triangles_clipped)?;
        writeln!(f, "  triangles rejected:         {:12}", self.triangles_rejected)?;
        if self.triangles_submitted > 0 {
            let reject_rate =
                (self.triangles_rejected as f64 / self.triangles_submitted as f64) * 100.0;
            writeln!(f, "  reject rate:                {:11.2}%", reject_rate)?;
        }

        writeln!(f, "Rasterization:")?;
        writeln!(f, "  triangles rasterized:       {:12}", self.triangles_rasterized)?;
        writeln!(f, "  degenerate skipped:         {:12}", self.triangles_degenerate)?;
        writeln!(f, "  scanlines drawn:            {:12}", self.scanlines_drawn)?;
        writeln!(f, "  scanlines skipped:          {:12}", self.scanlines_skipped)?;
        writeln!(f, "  pixels written:             {:12}", self.pixels_written)?;

        writeln!(f, "Targets:")?;
        write!(f, "  clear calls:                {:12}", self.target_clear_calls)
    }
}

/// Global function counters instance
pub static FUNCTION_COUNTERS: FunctionCounters = FunctionCounters::new();

/// Macro for incrementing a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_call {
    ($counter:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    };
}

/// Macro for adding to a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_add {
    ($counter:expr, $value:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add($value, std::sync::atomic::Ordering::Relaxed);
        }
    };
}
