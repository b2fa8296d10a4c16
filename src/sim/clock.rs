use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Longest single sleep while waiting for the next tick, so a stop request
/// is noticed promptly.
const WAIT_SLICE: Duration = Duration::from_millis(20);

/// Default tick period.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(1000);

/// Shared cancellation flag for a paced clock.
///
/// Cloning yields another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the clock to stop before its next tick.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A simulation clock that counts ticks, optionally bounded and paced.
///
/// Ticks are strictly serial: the callback for step `n` returns before step
/// `n + 1` is issued.
///
/// # Examples
///
/// ```
/// use aquaflow_sim::sim::clock::Clock;
///
/// let mut clock = Clock::new(3);
/// let mut steps = Vec::new();
///
/// clock.run(|step| steps.push(step));
/// assert_eq!(steps, vec![0, 1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    /// Next step to issue
    current: u64,
    /// Total steps to run, `None` for unbounded
    total: Option<u64>,
    /// Wall-clock period between ticks when paced
    period: Duration,
}

impl Clock {
    /// Creates a clock that issues `total` steps.
    pub fn new(total: u64) -> Self {
        Self {
            current: 0,
            total: Some(total),
            period: DEFAULT_PERIOD,
        }
    }

    /// Creates a clock that never runs out of steps.
    pub fn unbounded() -> Self {
        Self {
            current: 0,
            total: None,
            period: DEFAULT_PERIOD,
        }
    }

    /// Sets the wall-clock period used by [`Clock::run_paced`].
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn with_period(mut self, period: Duration) -> Self {
        assert!(!period.is_zero(), "clock period must be > 0");
        self.period = period;
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Advances the clock by one step.
    ///
    /// # Returns
    ///
    /// * `Some(step)` - The step number (starting from 0) before advancing
    /// * `None` - If the clock has reached its total steps
    pub fn tick(&mut self) -> Option<u64> {
        match self.total {
            Some(total) if self.current >= total => None,
            _ => {
                let step = self.current;
                self.current += 1;
                Some(step)
            }
        }
    }

    /// Runs `f` for each remaining step as fast as possible.
    ///
    /// On an unbounded clock this only returns if `f` panics; use
    /// [`Clock::run_paced`] with a [`StopSignal`] instead.
    pub fn run(&mut self, mut f: impl FnMut(u64)) {
        while let Some(step) = self.tick() {
            f(step);
        }
    }

    /// Runs `f` once per period until the steps run out or `stop` is set.
    ///
    /// The first tick fires one period after the call. The stop flag is
    /// checked before every tick and while waiting; a tick already in
    /// progress always completes. Returns the number of ticks executed.
    pub fn run_paced(&mut self, stop: &StopSignal, mut f: impl FnMut(u64)) -> u64 {
        let mut executed = 0;
        let mut deadline = Instant::now() + self.period;
        loop {
            if !wait_until(deadline, stop) {
                break;
            }
            let Some(step) = self.tick() else { break };
            f(step);
            executed += 1;
            // A slow tick delays the next one instead of bursting to catch up.
            deadline = (deadline + self.period).max(Instant::now());
        }
        executed
    }
}

/// Sleeps until `deadline` in short slices. Returns `false` if stopped.
fn wait_until(deadline: Instant, stop: &StopSignal) -> bool {
    loop {
        if stop.is_stopped() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(WAIT_SLICE));
    }
}
