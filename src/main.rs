mod config;
mod splash;
mod stopwatch;
mod ui;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::Context;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind};
use directories::ProjectDirs;
use futures::{Stream, StreamExt};
use ratatui::{DefaultTerminal, Frame};
use tokio::sync::{mpsc, watch};

use crate::config::{AppConfig, LOG_FILE_PREFIX};
use crate::splash::SplashController;
use crate::stopwatch::StopwatchEngine;
use crate::ui::{Control, StopwatchView};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Screen {
    Splash,
    Stopwatch,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppEvent {
    Navigate(Screen),
}

struct StopwatchApp {
    config: AppConfig,
    screen: Screen,
    splash: Option<SplashController>,
    stopwatch: Option<StopwatchEngine>,
    lap_scroll_offset: usize,
    quit: bool,
}

impl StopwatchApp {
    fn new(config: AppConfig, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        let splash = SplashController::mount(config.splash_duration, events);
        Self {
            config,
            screen: Screen::Splash,
            splash: Some(splash),
            stopwatch: None,
            lap_scroll_offset: 0,
            quit: false,
        }
    }

    fn draw(&self, frame: &mut Frame) {
        match (&self.screen, &self.splash, &self.stopwatch) {
            (Screen::Splash, Some(splash), _) => {
                ui::draw_splash(frame, &self.config.theme, splash.frame_glyph());
            }
            (Screen::Stopwatch, _, Some(engine)) => {
                let view = engine.with_core(StopwatchView::from_core);
                ui::draw_stopwatch(frame, &self.config.theme, &view, self.lap_scroll_offset);
            }
            _ => {}
        }
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Navigate(screen) => self.navigate(screen),
        }
    }

    /// Forward-only: the splash is torn down once the stopwatch is shown.
    fn navigate(&mut self, screen: Screen) {
        if screen == self.screen || screen == Screen::Splash {
            return;
        }
        if let Some(mut splash) = self.splash.take() {
            if splash.is_pending() {
                log::debug!("intro skipped");
            }
            splash.unmount();
        }
        self.stopwatch = Some(StopwatchEngine::new(self.config.sample_interval));
        self.lap_scroll_offset = 0;
        self.screen = screen;
        log::info!("navigated to {:?}", screen);
    }

    fn handle_key(&mut self, key: KeyCode) {
        if matches!(key, KeyCode::Char('q') | KeyCode::Esc) {
            self.quit = true;
            return;
        }

        match self.screen {
            // Any key skips the intro
            Screen::Splash => self.navigate(Screen::Stopwatch),
            Screen::Stopwatch => self.handle_key_stopwatch(key),
        }
    }

    fn handle_key_stopwatch(&mut self, key: KeyCode) {
        let Some(engine) = self.stopwatch.as_mut() else {
            return;
        };
        let secondary = if engine.is_running() { Control::Lap } else { Control::Reset };

        match key {
            KeyCode::Char(' ') | KeyCode::Enter => {
                engine.toggle_running();
            }
            KeyCode::Char('l') if secondary == Control::Lap => {
                engine.record_lap();
                self.lap_scroll_offset = 0;
            }
            KeyCode::Char('r') if secondary == Control::Reset => {
                engine.reset();
                self.lap_scroll_offset = 0;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.lap_scroll_offset = self.lap_scroll_offset.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.lap_scroll_offset + 1 < engine.laps().len() {
                    self.lap_scroll_offset += 1;
                }
            }
            KeyCode::PageUp => {
                self.lap_scroll_offset = self.lap_scroll_offset.saturating_sub(self.config.lap_page_size);
            }
            KeyCode::PageDown => {
                let last = engine.laps().len().saturating_sub(1);
                self.lap_scroll_offset = (self.lap_scroll_offset + self.config.lap_page_size).min(last);
            }
            _ => {}
        }
    }

    fn subscribe(&self) -> Option<watch::Receiver<u64>> {
        self.stopwatch.as_ref().map(StopwatchEngine::subscribe)
    }

    fn teardown(&mut self) {
        self.splash.take();
        self.stopwatch.take();
    }
}

async fn elapsed_changed(rx: &mut Option<watch::Receiver<u64>>) {
    if let Some(rx) = rx {
        if rx.changed().await.is_ok() {
            return;
        }
    }
    std::future::pending::<()>().await
}

/// Drive the app until quit or end of input. `draw` is called before every
/// wait.
async fn run_loop<S, D>(
    app: &mut StopwatchApp,
    mut events_rx: mpsc::UnboundedReceiver<AppEvent>,
    mut input: S,
    mut draw: D,
) -> anyhow::Result<()>
where
    S: Stream<Item = std::io::Result<Event>> + Unpin,
    D: FnMut(&StopwatchApp) -> anyhow::Result<()>,
{
    let mut frames = tokio::time::interval(app.config.splash_frame_interval);
    let mut elapsed_rx: Option<watch::Receiver<u64>> = None;

    while !app.quit {
        draw(app)?;

        tokio::select! {
            maybe_event = input.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => app.handle_key(key.code),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e).context("terminal input failed"),
                None => break,
            },
            Some(event) = events_rx.recv() => app.handle_event(event),
            _ = frames.tick(), if app.screen == Screen::Splash => {
                if let Some(splash) = app.splash.as_mut() {
                    splash.advance_frame();
                }
            }
            _ = elapsed_changed(&mut elapsed_rx) => {}
        }

        if elapsed_rx.is_none() {
            elapsed_rx = app.subscribe();
        }
    }

    app.teardown();
    Ok(())
}

async fn run(terminal: &mut DefaultTerminal, config: AppConfig) -> anyhow::Result<()> {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let mut app = StopwatchApp::new(config, events_tx);
    run_loop(&mut app, events_rx, EventStream::new(), |app| {
        terminal.draw(|frame| app.draw(frame)).context("can't draw")?;
        Ok(())
    })
    .await
}

fn log_dir() -> PathBuf {
    ProjectDirs::from("", "", "stopwatch")
        .map(|dirs| dirs.data_local_dir().join("logs"))
        .unwrap_or_else(std::env::temp_dir)
}

/// One file per process; never opens a file that already exists.
fn open_log_file(dir: &Path, pid: u32) -> anyhow::Result<(PathBuf, File)> {
    std::fs::create_dir_all(dir).with_context(|| format!("can't create {}", dir.display()))?;
    let path = dir.join(format!("{}-{}.log", LOG_FILE_PREFIX, pid));
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .with_context(|| format!("can't create {}", path.display()))?;
    Ok((path, file))
}

fn init_logging() -> anyhow::Result<PathBuf> {
    let (path, file) = open_log_file(&log_dir(), std::process::id())?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(path)
}

fn main() -> anyhow::Result<()> {
    let log_path = init_logging()?;
    log::info!("Stopwatch PID is {}, logging to {}", std::process::id(), log_path.display());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("can't build runtime")?;
    let local = tokio::task::LocalSet::new();

    let mut terminal = ratatui::try_init().context("can't set up terminal")?;
    let result = local.block_on(&runtime, run(&mut terminal, AppConfig::default()));
    ratatui::restore();

    if let Err(e) = &result {
        log::error!("exiting with error: {:#}", e);
    }
    result
}
