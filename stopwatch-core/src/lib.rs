//! Pure stopwatch logic with no platform dependencies.
//! Every operation takes the current instant explicitly, so the whole
//! state machine is testable on host without a clock.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RunningMode {
    Stopped,
    Running,
}

/// A lap captured while the stopwatch was running. Never mutated after
/// capture.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Lap {
    /// Wall-clock capture instant in Unix milliseconds, unique per stopwatch.
    pub id: i64,
    /// `elapsed_ms` rendered as `MM:SS.CC`.
    pub display: String,
    pub elapsed_ms: u64,
}

pub struct StopwatchCore {
    mode: RunningMode,
    elapsed_ms: u64,
    // Signed so that `now - elapsed` is exact even when `now < elapsed`.
    reference_start_ms: i64,
    laps: Vec<Lap>,
}

impl Default for StopwatchCore {
    fn default() -> Self {
        Self::new()
    }
}

impl StopwatchCore {
    pub fn new() -> Self {
        Self {
            mode: RunningMode::Stopped,
            elapsed_ms: 0,
            reference_start_ms: 0,
            laps: Vec::new(),
        }
    }

    pub fn mode(&self) -> RunningMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.mode == RunningMode::Running
    }

    /// Last sampled elapsed time. Frozen while stopped.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Recorded laps, most recent first.
    pub fn laps(&self) -> &[Lap] {
        &self.laps
    }

    pub fn start(&mut self, now_ms: u64) {
        if self.mode == RunningMode::Running {
            return;
        }
        self.reference_start_ms = now_ms as i64 - self.elapsed_ms as i64;
        self.mode = RunningMode::Running;
    }

    pub fn stop(&mut self) {
        self.mode = RunningMode::Stopped;
    }

    pub fn toggle(&mut self, now_ms: u64) -> RunningMode {
        match self.mode {
            RunningMode::Stopped => self.start(now_ms),
            RunningMode::Running => self.stop(),
        }
        self.mode
    }

    /// Recompute elapsed time from the reference instant. Returns the new
    /// value while running, `None` while stopped.
    pub fn sample(&mut self, now_ms: u64) -> Option<u64> {
        if self.mode != RunningMode::Running {
            return None;
        }
        let since_reference = (now_ms as i64 - self.reference_start_ms).max(0) as u64;
        // Never step backwards, even if the caller's clock does.
        self.elapsed_ms = self.elapsed_ms.max(since_reference);
        Some(self.elapsed_ms)
    }

    pub fn reset(&mut self) {
        self.mode = RunningMode::Stopped;
        self.elapsed_ms = 0;
        self.reference_start_ms = 0;
        self.laps.clear();
    }

    /// Capture the current elapsed time as a new lap. Does nothing while
    /// stopped.
    pub fn record_lap(&mut self, wall_clock_ms: i64) -> Option<&Lap> {
        if self.mode != RunningMode::Running {
            return None;
        }
        let id = match self.laps.first() {
            Some(latest) if wall_clock_ms <= latest.id => latest.id + 1,
            _ => wall_clock_ms,
        };
        self.laps.insert(
            0,
            Lap {
                id,
                display: format_time(self.elapsed_ms),
                elapsed_ms: self.elapsed_ms,
            },
        );
        self.laps.first()
    }

    /// Time between each lap and the one before it, in the same
    /// most-recent-first order as `laps()`.
    pub fn splits(&self) -> Vec<u64> {
        self.laps
            .iter()
            .enumerate()
            .map(|(i, lap)| {
                let previous = self.laps.get(i + 1).map(|l| l.elapsed_ms).unwrap_or(0);
                lap.elapsed_ms.saturating_sub(previous)
            })
            .collect()
    }
}

/// Format milliseconds as "MM:SS.CC" (minutes wrap at one hour)
pub fn format_time(ms: u64) -> String {
    let total_secs = ms / 1000;
    let cs = (ms % 1000) / 10;
    let m = (total_secs / 60) % 60;
    let s = total_secs % 60;
    format!("{:02}:{:02}.{:02}", m, s, cs)
}
