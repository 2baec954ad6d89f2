/// Per-stage timing of the lattice step.
///
/// Provides RAII-style profiling scopes that accumulate into a `StageTimer`.
use std::fmt;
use std::time::{Duration, Instant};
use tracing::trace;

/// Stage of one lattice iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Density and velocity recovery
    Macroscopic,
    /// Equilibrium populations
    Equilibrium,
    /// TRT collision
    Collision,
    /// Streaming into the back buffer
    Streaming,
    /// Zou-He wall and corner closure
    Boundary,
    /// Sentinel scan of the perimeter
    Verify,
}

impl Stage {
    /// Every stage, in execution order
    pub const ALL: [Stage; 6] = [
        Stage::Macroscopic,
        Stage::Equilibrium,
        Stage::Collision,
        Stage::Streaming,
        Stage::Boundary,
        Stage::Verify,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Short lowercase name
    pub fn name(self) -> &'static str {
        match self {
            Stage::Macroscopic => "macroscopic",
            Stage::Equilibrium => "equilibrium",
            Stage::Collision => "collision",
            Stage::Streaming => "streaming",
            Stage::Boundary => "boundary",
            Stage::Verify => "verify",
        }
    }
}

/// Accumulated wall time and call count per stage
#[derive(Debug, Clone, Default)]
pub struct StageTimer {
    totals: [Duration; 6],
    calls: [u64; 6],
}

impl StageTimer {
    /// Creates an empty timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts timing `stage`; the time is recorded when the scope is dropped.
    pub fn scope(&mut self, stage: Stage) -> ProfilerScope<'_> {
        ProfilerScope {
            start: Instant::now(),
            stage,
            timer: self,
        }
    }

    /// Records a measured duration for `stage`.
    pub fn record(&mut self, stage: Stage, elapsed: Duration) {
        self.totals[stage.index()] += elapsed;
        self.calls[stage.index()] += 1;
    }

    /// Total time spent in `stage`
    pub fn total(&self, stage: Stage) -> Duration {
        self.totals[stage.index()]
    }

    /// Number of times `stage` ran
    pub fn calls(&self, stage: Stage) -> u64 {
        self.calls[stage.index()]
    }

    /// Total time over every stage
    pub fn overall(&self) -> Duration {
        self.totals.iter().sum()
    }

    /// Clears all totals.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for StageTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let overall = self.overall().as_secs_f64();
        for (k, stage) in Stage::ALL.iter().enumerate() {
            let secs = self.total(*stage).as_secs_f64();
            let share = if overall > 0.0 { 100.0 * secs / overall } else { 0.0 };
            if k > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {:.3}s ({:.1}%)", stage.name(), secs, share)?;
        }
        Ok(())
    }
}

/// A profiling scope that measures elapsed time using RAII.
///
/// Time is added to the owning `StageTimer` when dropped.
pub struct ProfilerScope<'a> {
    start: Instant,
    stage: Stage,
    timer: &'a mut StageTimer,
}

impl ProfilerScope<'_> {
    /// Gets elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ProfilerScope<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        trace!(stage = self.stage.name(), elapsed_us = elapsed.as_micros() as u64, "stage done");
        self.timer.record(self.stage, elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_profiler_scope_measures_time() {
        let mut timer = StageTimer::new();
        {
            let scope = timer.scope(Stage::Collision);
            thread::sleep(Duration::from_millis(10));
            let elapsed = scope.elapsed_ms();
            assert!(elapsed >= 10.0, "Expected at least 10ms, got {elapsed}");
        }
        assert_eq!(timer.calls(Stage::Collision), 1);
        assert!(timer.total(Stage::Collision) >= Duration::from_millis(10));
        assert_eq!(timer.calls(Stage::Streaming), 0);
    }

    #[test]
    fn test_stage_timer_accumulates_and_resets() {
        let mut timer = StageTimer::new();
        timer.record(Stage::Streaming, Duration::from_millis(3));
        timer.record(Stage::Streaming, Duration::from_millis(4));
        timer.record(Stage::Boundary, Duration::from_millis(1));

        assert_eq!(timer.calls(Stage::Streaming), 2);
        assert_eq!(timer.total(Stage::Streaming), Duration::from_millis(7));
        assert_eq!(timer.overall(), Duration::from_millis(8));
        assert!(timer.to_string().contains("streaming 0.007s"));

        timer.reset();
        assert_eq!(timer.overall(), Duration::ZERO);
    }
}
