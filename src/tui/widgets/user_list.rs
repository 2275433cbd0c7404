//! User list widget - selectable table of users

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::tui::theme::Theme;
use crate::types::User;

/// Maximum content width (consistent with the chart view)
const MAX_CONTENT_WIDTH: u16 = 120;

/// Column definitions: (label, width)
const COLUMNS: [(&str, u16); 3] = [("ID", 10), ("Name", 36), ("Email", 40)];

/// Most user rows shown at once (excluding header)
pub const MAX_VISIBLE_ROWS: usize = 20;

/// Rows taken by padding, title, separators, header and keybindings
const CHROME_ROWS: u16 = 6;

/// User rows that fit in a view of `height` terminal rows
pub fn visible_rows(height: u16) -> usize {
    (height.saturating_sub(CHROME_ROWS) as usize).clamp(1, MAX_VISIBLE_ROWS)
}

/// Truncate to `width` characters, marking the cut with an ellipsis
fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Selection state for the user list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserSelection {
    pub selected: usize,
    pub scroll_offset: usize,
}

impl UserSelection {
    /// Move selection up, scrolling to keep it visible
    pub fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        }
    }

    /// Move selection down within `count` users, `visible` rows on screen
    pub fn down(&mut self, count: usize, visible: usize) {
        if count == 0 {
            return;
        }
        self.selected = (self.selected + 1).min(count - 1);
        self.scroll_offset = self.offset_for(visible);
    }

    /// Clamp after the list or the viewport changed
    pub fn clamp(&mut self, count: usize, visible: usize) {
        self.selected = self.selected.min(count.saturating_sub(1));
        self.scroll_offset = self
            .scroll_offset
            .min(count.saturating_sub(visible.max(1)));
        self.scroll_offset = self.offset_for(visible);
    }

    /// First row to draw so the selection is within `visible` rows
    pub fn offset_for(&self, visible: usize) -> usize {
        let visible = visible.max(1);
        if self.selected < self.scroll_offset {
            self.selected
        } else if self.selected >= self.scroll_offset + visible {
            self.selected + 1 - visible
        } else {
            self.scroll_offset
        }
    }
}

/// Users table view
pub struct UserListView<'a> {
    users: &'a [User],
    selection: UserSelection,
    theme: Theme,
}

impl<'a> UserListView<'a> {
    pub fn new(users: &'a [User], selection: UserSelection, theme: Theme) -> Self {
        Self {
            users,
            selection,
            theme,
        }
    }
}

impl Widget for UserListView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let content_width = area.width.min(MAX_CONTENT_WIDTH);
        let x_offset = (area.width.saturating_sub(content_width)) / 2;
        let centered_area = Rect {
            x: area.x + x_offset,
            y: area.y,
            width: content_width,
            height: area.height,
        };

        let visible_rows = self.users.len().clamp(1, visible_rows(area.height)) as u16;
        let chunks = Layout::vertical([
            Constraint::Length(1),            // Top padding
            Constraint::Length(1),            // Title
            Constraint::Length(1),            // Separator
            Constraint::Length(1),            // Header
            Constraint::Length(visible_rows), // User rows
            Constraint::Length(1),            // Separator
            Constraint::Length(1),            // Keybindings
            Constraint::Min(0),               // Remaining space
        ])
        .split(centered_area);

        self.render_title(chunks[1], buf);
        self.render_separator(chunks[2], buf);
        self.render_header(chunks[3], buf);
        self.render_rows(chunks[4], buf);
        self.render_separator(chunks[5], buf);
        self.render_keybindings(chunks[6], buf);
    }
}

impl UserListView<'_> {
    fn table_x(area: Rect) -> u16 {
        let table_width: u16 = COLUMNS.iter().map(|c| c.1).sum();
        area.x + area.width.saturating_sub(table_width) / 2
    }

    fn render_title(&self, area: Rect, buf: &mut Buffer) {
        let line = Line::from(vec![
            Span::styled(
                "Users",
                Style::default()
                    .fg(self.theme.text())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  ({})", self.users.len()),
                Style::default().fg(self.theme.muted()),
            ),
        ]);
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .render(area, buf);
    }

    fn render_separator(&self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let line = "─".repeat(area.width as usize);
        buf.set_string(
            area.x,
            area.y,
            &line,
            Style::default().fg(self.theme.muted()),
        );
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let style = Style::default()
            .fg(self.theme.muted())
            .add_modifier(Modifier::BOLD);
        let mut x = Self::table_x(area);
        for (label, width) in COLUMNS {
            if x >= area.right() {
                break;
            }
            let text = fit(label, width as usize);
            buf.set_stringn(x, area.y, &text, (area.right() - x) as usize, style);
            x += width;
        }
    }

    fn render_rows(&self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        if self.users.is_empty() {
            Paragraph::new("No users found")
                .style(Style::default().fg(self.theme.muted()))
                .alignment(Alignment::Center)
                .render(area, buf);
            return;
        }

        let start = self.selection.offset_for(area.height as usize);
        let visible = self
            .users
            .iter()
            .enumerate()
            .skip(start)
            .take(area.height as usize);

        for (row, (index, user)) in visible.enumerate() {
            let y = area.y + row as u16;
            let selected = index == self.selection.selected;
            let style = if selected {
                Style::default()
                    .fg(self.theme.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.text())
            };

            let marker = if selected { "▸ " } else { "  " };
            let cells = [
                format!("{}{}", marker, user.id),
                user.display_name(),
                user.email.clone().unwrap_or_else(|| "-".into()),
            ];

            let mut x = Self::table_x(area);
            for ((_, width), text) in COLUMNS.iter().zip(cells) {
                if x >= area.right() {
                    break;
                }
                let text = fit(&text, width.saturating_sub(1) as usize);
                buf.set_stringn(x, y, &text, (area.right() - x) as usize, style);
                x += width;
            }
        }
    }

    fn render_keybindings(&self, area: Rect, buf: &mut Buffer) {
        let key = Style::default().fg(self.theme.accent());
        let hint = Style::default().fg(self.theme.muted());
        let line = Line::from(vec![
            Span::styled("↑↓", key),
            Span::styled(" select  ", hint),
            Span::styled("Enter", key),
            Span::styled(" chart  ", hint),
            Span::styled("r", key),
            Span::styled(" reload  ", hint),
            Span::styled("?", key),
            Span::styled(" help  ", hint),
            Span::styled("q", key),
            Span::styled(" quit", hint),
        ]);
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}
