use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;
use stopwatch_core::{format_time, StopwatchCore};

use crate::config::Theme;

const TITLE: &str = "Stopwatch";
const SUBTITLE: &str = "Track your time";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Control {
    Start,
    Stop,
    Lap,
    Reset,
}

impl Control {
    pub fn label(self) -> &'static str {
        match self {
            Control::Start => "Start",
            Control::Stop => "Stop",
            Control::Lap => "Lap",
            Control::Reset => "Reset",
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LapRow {
    /// 1-based, oldest lap is 1.
    pub number: usize,
    pub time: String,
    pub split: String,
}

/// Everything the stopwatch screen shows, derived from engine state.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct StopwatchView {
    pub time: String,
    pub primary: Control,
    pub secondary: Control,
    pub laps: Vec<LapRow>,
}

impl StopwatchView {
    pub fn from_core(core: &StopwatchCore) -> Self {
        let (primary, secondary) = if core.is_running() {
            (Control::Stop, Control::Lap)
        } else {
            (Control::Start, Control::Reset)
        };
        let count = core.laps().len();
        let laps = core
            .laps()
            .iter()
            .zip(core.splits())
            .enumerate()
            .map(|(position, (lap, split))| LapRow {
                number: count - position,
                time: lap.display.clone(),
                split: format_time(split),
            })
            .collect();
        Self {
            time: format_time(core.elapsed_ms()),
            primary,
            secondary,
            laps,
        }
    }
}

pub fn draw_splash(frame: &mut Frame, theme: &Theme, glyph: &str) {
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.splash_background)),
        area,
    );

    let [_, art, text, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Fill(1),
    ])
    .areas(area);

    let glyph_line = Paragraph::new(Line::from(glyph))
        .alignment(Alignment::Center)
        .style(Style::default().fg(theme.text));
    frame.render_widget(glyph_line, art);

    let lines = vec![
        Line::from(Span::styled(
            TITLE,
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(SUBTITLE, Style::default().fg(theme.splash_subtitle))),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), text);
}

pub fn draw_stopwatch(frame: &mut Frame, theme: &Theme, view: &StopwatchView, lap_scroll_offset: usize) {
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.background)),
        area,
    );

    let [header, timer, controls, laps, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(5),
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    let title = Paragraph::new(Span::styled(
        TITLE,
        Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    frame.render_widget(title, header);

    let time = Paragraph::new(Span::styled(
        view.time.as_str(),
        Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.divider))
            .style(Style::default().bg(theme.surface)),
    );
    frame.render_widget(time, timer);

    draw_controls(frame, theme, view, controls);
    draw_laps(frame, theme, view, lap_scroll_offset, laps);

    let hint = match view.secondary {
        Control::Lap => "space=stop  l=lap  q=quit",
        _ => "space=start  r=reset  ↑↓/PgUp/PgDn=scroll  q=quit",
    };
    let footer_line = Paragraph::new(Span::styled(hint, Style::default().fg(theme.text_secondary)))
        .alignment(Alignment::Center);
    frame.render_widget(footer_line, footer);
}

fn draw_controls(frame: &mut Frame, theme: &Theme, view: &StopwatchView, area: Rect) {
    let [_, primary, secondary, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Fill(1),
    ])
    .areas(area);

    let primary_button = Paragraph::new(view.primary.label())
        .alignment(Alignment::Center)
        .style(Style::default().fg(theme.text).bg(theme.accent))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(theme.accent)));
    frame.render_widget(primary_button, primary);

    // Lap is the highlighted action; Reset stays muted
    let (fg, border) = match view.secondary {
        Control::Lap => (theme.text, theme.primary),
        _ => (theme.text_secondary, theme.primary_dark),
    };
    let secondary_button = Paragraph::new(view.secondary.label())
        .alignment(Alignment::Center)
        .style(Style::default().fg(fg).bg(theme.surface))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(border)));
    frame.render_widget(secondary_button, secondary);
}

fn draw_laps(frame: &mut Frame, theme: &Theme, view: &StopwatchView, scroll: usize, area: Rect) {
    if view.laps.is_empty() {
        return;
    }

    let items: Vec<ListItem> = view
        .laps
        .iter()
        .skip(scroll)
        .map(|row| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("Lap {:<4}", row.number), Style::default().fg(theme.text_secondary)),
                Span::styled(format!("  {}", row.time), Style::default().fg(theme.text)),
                Span::styled(format!("  +{}", row.split), Style::default().fg(theme.text_secondary)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(Span::styled("Laps", Style::default().fg(theme.text).add_modifier(Modifier::BOLD)))
            .borders(Borders::TOP)
            .border_style(Style::default().fg(theme.divider)),
    );
    frame.render_widget(list, area);
}
