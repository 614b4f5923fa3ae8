use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use stopwatch_core::{Lap, RunningMode, StopwatchCore};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

struct Shared {
    core: StopwatchCore,
    epoch: Instant,
    elapsed_tx: watch::Sender<u64>,
}

impl Shared {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// The recurring task that refreshes elapsed time while running.
/// Dropping the handle cancels the task.
struct Sampler {
    handle: JoinHandle<()>,
}

impl Sampler {
    fn spawn(shared: Rc<RefCell<Shared>>, interval: Duration) -> Self {
        let handle = tokio::task::spawn_local(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let mut state = shared.borrow_mut();
                let now = state.now_ms();
                let sampled = state.core.sample(now);
                match sampled {
                    Some(elapsed) => {
                        state.elapsed_tx.send_replace(elapsed);
                    }
                    None => break,
                }
            }
        });
        Self { handle }
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Stopwatch driven by a periodic sampling task on the current `LocalSet`.
///
/// Holds at most one sampler at a time. Stopping, resetting and dropping the
/// engine all cancel it synchronously, so no tick can land after the call
/// returns.
pub struct StopwatchEngine {
    shared: Rc<RefCell<Shared>>,
    sampler: Option<Sampler>,
    sample_interval: Duration,
}

impl StopwatchEngine {
    /// Must be called from within a `LocalSet`.
    pub fn new(sample_interval: Duration) -> Self {
        let (elapsed_tx, _) = watch::channel(0);
        Self {
            shared: Rc::new(RefCell::new(Shared {
                core: StopwatchCore::new(),
                epoch: Instant::now(),
                elapsed_tx,
            })),
            sampler: None,
            sample_interval,
        }
    }

    pub fn toggle_running(&mut self) -> RunningMode {
        if self.is_running() {
            self.halt_sampler();
            self.shared.borrow_mut().core.stop();
            log::debug!("stopwatch stopped at {} ms", self.elapsed_ms());
        } else {
            {
                let mut state = self.shared.borrow_mut();
                let now = state.now_ms();
                state.core.start(now);
            }
            self.acquire_sampler();
            log::debug!("stopwatch running from {} ms", self.elapsed_ms());
        }
        self.mode()
    }

    pub fn reset(&mut self) {
        self.halt_sampler();
        let mut state = self.shared.borrow_mut();
        state.core.reset();
        state.elapsed_tx.send_replace(0);
        log::debug!("stopwatch reset");
    }

    /// Capture a lap stamped with the current wall-clock time. Returns
    /// `None` while stopped.
    pub fn record_lap(&mut self) -> Option<Lap> {
        let wall_clock_ms = chrono::Utc::now().timestamp_millis();
        let lap = self.shared.borrow_mut().core.record_lap(wall_clock_ms).cloned();
        match &lap {
            Some(lap) => log::debug!("lap {} recorded at {}", lap.id, lap.display),
            None => log::debug!("lap ignored while stopped"),
        }
        lap
    }

    pub fn mode(&self) -> RunningMode {
        self.shared.borrow().core.mode()
    }

    pub fn is_running(&self) -> bool {
        self.shared.borrow().core.is_running()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.shared.borrow().core.elapsed_ms()
    }

    /// Snapshot of recorded laps, most recent first.
    pub fn laps(&self) -> Vec<Lap> {
        self.shared.borrow().core.laps().to_vec()
    }

    pub fn with_core<R>(&self, f: impl FnOnce(&StopwatchCore) -> R) -> R {
        f(&self.shared.borrow().core)
    }

    /// Observe every published elapsed value.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.borrow().elapsed_tx.subscribe()
    }

    #[cfg(test)]
    pub fn has_active_sampler(&self) -> bool {
        self.sampler.is_some()
    }

    fn acquire_sampler(&mut self) {
        self.halt_sampler();
        self.sampler = Some(Sampler::spawn(self.shared.clone(), self.sample_interval));
    }

    fn halt_sampler(&mut self) {
        self.sampler.take();
    }
}

impl Drop for StopwatchEngine {
    fn drop(&mut self) {
        if self.sampler.is_some() {
            log::debug!("stopwatch torn down while running");
        }
        self.halt_sampler();
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;

    use tokio::task::LocalSet;
    use tokio::time::sleep;

    use super::*;

    const TICK: Duration = Duration::from_millis(10);

    async fn run_local<F: Future>(f: F) -> F::Output {
        LocalSet::new().run_until(f).await
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_wait_stop() {
        run_local(async {
            let mut sw = StopwatchEngine::new(TICK);
            assert_eq!(sw.toggle_running(), RunningMode::Running);
            assert!(sw.has_active_sampler());

            let mut last = 0;
            for _ in 0..10 {
                sleep(TICK).await;
                let elapsed = sw.elapsed_ms();
                assert!(elapsed >= last);
                last = elapsed;
            }

            assert_eq!(sw.toggle_running(), RunningMode::Stopped);
            assert!(!sw.has_active_sampler());
            let elapsed = sw.elapsed_ms();
            assert!((90..=100).contains(&elapsed), "elapsed {}", elapsed);

            sleep(Duration::from_millis(500)).await;
            assert_eq!(sw.elapsed_ms(), elapsed);
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_resume_accumulates() {
        run_local(async {
            let mut sw = StopwatchEngine::new(TICK);
            sw.toggle_running();
            sleep(Duration::from_millis(50)).await;
            sw.toggle_running();

            // Time spent stopped does not count
            sleep(Duration::from_millis(200)).await;

            sw.toggle_running();
            sleep(Duration::from_millis(50)).await;
            sw.toggle_running();

            let elapsed = sw.elapsed_ms();
            assert!((80..=100).contains(&elapsed), "elapsed {}", elapsed);
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_toggles_leave_no_sampler() {
        run_local(async {
            let mut sw = StopwatchEngine::new(TICK);
            for _ in 0..9 {
                sw.toggle_running();
            }
            assert!(sw.is_running());
            sleep(Duration::from_millis(30)).await;
            sw.toggle_running();

            let frozen = sw.elapsed_ms();
            sleep(Duration::from_millis(200)).await;
            assert_eq!(sw.elapsed_ms(), frozen);
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_lap_requires_running() {
        run_local(async {
            let mut sw = StopwatchEngine::new(TICK);
            assert!(sw.record_lap().is_none());
            assert!(sw.laps().is_empty());

            sw.toggle_running();
            sleep(Duration::from_millis(20)).await;
            sw.toggle_running();
            assert!(sw.record_lap().is_none());
            assert!(sw.laps().is_empty());
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_laps_most_recent_first() {
        run_local(async {
            let mut sw = StopwatchEngine::new(TICK);
            sw.toggle_running();
            for _ in 0..3 {
                sleep(Duration::from_millis(105)).await;
                assert!(sw.record_lap().is_some());
            }

            let laps = sw.laps();
            assert_eq!(laps.len(), 3);
            assert!(laps[0].elapsed_ms > laps[1].elapsed_ms);
            assert!(laps[1].elapsed_ms > laps[2].elapsed_ms);
            assert!(laps[0].id > laps[1].id && laps[1].id > laps[2].id);
            assert_eq!(laps[0].display, stopwatch_core::format_time(laps[0].elapsed_ms));
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_from_running() {
        run_local(async {
            let mut sw = StopwatchEngine::new(TICK);
            let rx = sw.subscribe();
            sw.toggle_running();
            sleep(Duration::from_millis(60)).await;
            sw.record_lap();
            sw.record_lap();

            sw.reset();
            assert_eq!(sw.mode(), RunningMode::Stopped);
            assert_eq!(sw.elapsed_ms(), 0);
            assert!(sw.laps().is_empty());
            assert!(!sw.has_active_sampler());
            assert_eq!(*rx.borrow(), 0);

            sleep(Duration::from_millis(200)).await;
            assert_eq!(sw.elapsed_ms(), 0);
            assert_eq!(*rx.borrow(), 0);
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_while_stopped_is_idempotent() {
        run_local(async {
            let mut sw = StopwatchEngine::new(TICK);
            sw.reset();
            sw.reset();
            assert_eq!(sw.mode(), RunningMode::Stopped);
            assert_eq!(sw.elapsed_ms(), 0);

            sw.toggle_running();
            sleep(Duration::from_millis(40)).await;
            assert!(sw.elapsed_ms() > 0);
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_samples() {
        run_local(async {
            let mut sw = StopwatchEngine::new(TICK);
            let mut rx = sw.subscribe();
            sw.toggle_running();
            sleep(Duration::from_millis(35)).await;
            assert!(rx.has_changed().unwrap());
            assert_eq!(*rx.borrow_and_update(), sw.elapsed_ms());
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_sampler() {
        run_local(async {
            let mut sw = StopwatchEngine::new(TICK);
            let mut rx = sw.subscribe();
            sw.toggle_running();
            sleep(Duration::from_millis(30)).await;
            rx.borrow_and_update();

            drop(sw);
            sleep(Duration::from_millis(100)).await;
            // Nothing published after teardown; closed counts as unchanged.
            assert!(!rx.has_changed().unwrap_or(false));
        })
        .await;
    }
}
