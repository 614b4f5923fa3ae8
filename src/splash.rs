use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::{AppEvent, Screen};

const FRAMES: [&str; 4] = ["⧗", "⧖", "⧗", "⌛"];

/// Intro screen state: an animation frame counter and a one-shot timer that
/// navigates to the stopwatch. Tearing it down before the timer fires
/// cancels the navigation.
pub struct SplashController {
    pending: Option<JoinHandle<()>>,
    fired: Rc<Cell<bool>>,
    frame: usize,
}

impl SplashController {
    /// Must be called from within a `LocalSet`.
    pub fn mount(duration: Duration, events: UnboundedSender<AppEvent>) -> Self {
        log::info!("splash mounted, navigating in {} ms", duration.as_millis());
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(duration).await;
            flag.set(true);
            log::info!("splash finished");
            events.send(AppEvent::Navigate(Screen::Stopwatch)).ok();
        });
        Self {
            pending: Some(handle),
            fired,
            frame: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some() && !self.fired.get()
    }

    pub fn unmount(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !self.fired.get() {
                log::info!("splash torn down early, navigation cancelled");
            }
            handle.abort();
        }
    }

    pub fn advance_frame(&mut self) {
        self.frame = (self.frame + 1) % FRAMES.len();
    }

    pub fn frame_glyph(&self) -> &'static str {
        FRAMES[self.frame]
    }
}

impl Drop for SplashController {
    fn drop(&mut self) {
        self.unmount();
    }
}
