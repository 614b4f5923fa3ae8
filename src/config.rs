use std::time::Duration;

use ratatui::style::Color;

pub const SPLASH_DURATION_MS: u64 = 4000;
pub const SAMPLE_INTERVAL_MS: u64 = 10;
pub const SPLASH_FRAME_INTERVAL_MS: u64 = 250;
pub const LAP_PAGE_SIZE: usize = 10;
pub const LOG_FILE_PREFIX: &str = "stopwatch";

#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub background: Color,
    pub surface: Color,
    pub primary: Color,
    pub primary_dark: Color,
    pub text: Color,
    pub text_secondary: Color,
    pub accent: Color,
    pub divider: Color,
    pub splash_background: Color,
    pub splash_subtitle: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Rgb(0x0F, 0x0F, 0x1E),
            surface: Color::Rgb(0x1A, 0x1A, 0x2E),
            primary: Color::Rgb(0x6C, 0x63, 0xFF),
            primary_dark: Color::Rgb(0x4D, 0x44, 0xDB),
            text: Color::Rgb(0xFF, 0xFF, 0xFF),
            text_secondary: Color::Rgb(0xA0, 0xA0, 0xB0),
            accent: Color::Rgb(0xFF, 0x65, 0x84),
            divider: Color::Rgb(0x2A, 0x2A, 0x3A),
            splash_background: Color::Rgb(0x4F, 0x46, 0xE5),
            splash_subtitle: Color::Rgb(0xC7, 0xD2, 0xFE),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AppConfig {
    pub splash_duration: Duration,
    pub sample_interval: Duration,
    pub splash_frame_interval: Duration,
    pub lap_page_size: usize,
    pub theme: Theme,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            splash_duration: Duration::from_millis(SPLASH_DURATION_MS),
            sample_interval: Duration::from_millis(SAMPLE_INTERVAL_MS),
            splash_frame_interval: Duration::from_millis(SPLASH_FRAME_INTERVAL_MS),
            lap_page_size: LAP_PAGE_SIZE,
            theme: Theme::default(),
        }
    }
}
