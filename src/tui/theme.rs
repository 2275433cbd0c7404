//! Terminal theme detection and color definitions

use ratatui::style::Color;

use crate::types::Category;

/// Terminal color scheme (dark or light background)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Auto-detect terminal theme from background luminance.
    /// Must be called **before** entering raw mode (ratatui::init).
    /// Falls back to Dark if detection fails.
    pub fn detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.6 => Self::Light,
            _ => Self::Dark,
        }
    }

    /// Primary text color (headers, body text)
    pub fn text(self) -> Color {
        match self {
            Self::Dark => Color::White,
            Self::Light => Color::Black,
        }
    }

    /// Active/accent color (selection, keybinding keys)
    pub fn accent(self) -> Color {
        match self {
            Self::Dark => Color::Cyan,
            Self::Light => Color::Indexed(25), // dark blue (ANSI 256)
        }
    }

    /// Secondary/muted text (separators, hints, empty bars)
    pub fn muted(self) -> Color {
        match self {
            Self::Dark => Color::DarkGray,
            Self::Light => Color::Gray,
        }
    }

    /// Day label color on the chart axis
    pub fn day(self) -> Color {
        match self {
            Self::Dark => Color::Yellow,
            Self::Light => Color::Indexed(130), // dark orange/yellow (ANSI 256)
        }
    }

    /// Money text color (totals, annotations)
    pub fn cost(self) -> Color {
        match self {
            Self::Dark => Color::Magenta,
            Self::Light => Color::Indexed(90), // dark magenta (ANSI 256)
        }
    }

    /// Error/negative indicator color
    pub fn error(self) -> Color {
        match self {
            Self::Dark => Color::Red,
            Self::Light => Color::Indexed(124), // dark red (ANSI 256)
        }
    }

    /// Stacked-bar segment color per revenue category
    pub fn category(self, category: Category) -> Color {
        match self {
            Self::Dark => match category {
                Category::Packages => Color::Indexed(75),  // sky blue
                Category::Emails => Color::Indexed(114),   // green
                Category::Chats => Color::Indexed(221),    // amber
                Category::Calls => Color::Indexed(204),    // pink
                Category::Invoices => Color::Indexed(141), // violet
            },
            Self::Light => match category {
                Category::Packages => Color::Indexed(25),
                Category::Emails => Color::Indexed(28),
                Category::Chats => Color::Indexed(130),
                Category::Calls => Color::Indexed(161),
                Category::Invoices => Color::Indexed(91),
            },
        }
    }
}
