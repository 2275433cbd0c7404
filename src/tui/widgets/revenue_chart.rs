//! Revenue chart widget - stacked weekday bars for one user

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::tui::theme::Theme;
use crate::types::{Category, DayName, RevenueReport};

/// Maximum content width (consistent with the user list)
const MAX_CONTENT_WIDTH: u16 = 120;

/// Widest bar drawn per day
const MAX_BAR_WIDTH: u16 = 9;

/// Smallest area the chart draws into
const MIN_WIDTH: u16 = 14;
const MIN_HEIGHT: u16 = 9;

const BAR_CELL: &str = "█";
const BASELINE_CELL: &str = "▁";

/// Format a dollar amount with thousands separators: 1234.5 → "$1,234.50"
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let len = whole.len();

    let mut grouped = String::with_capacity(len + len / 3);
    // Digits are ASCII, so byte indexing is safe
    for (i, ch) in whole.bytes().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch as char);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// Short dollar amount for narrow columns: "$12", "$1.2k", "$3.4M"
pub fn format_compact_currency(amount: f64) -> String {
    if amount >= 1_000_000.0 {
        format!("${:.1}M", amount / 1_000_000.0)
    } else if amount >= 1_000.0 {
        format!("${:.1}k", amount / 1_000.0)
    } else {
        format!("${:.0}", amount)
    }
}

/// Rows each category occupies in a stacked bar of `height` rows, scaled so
/// that `max` fills the full height. Cumulative rounding keeps the stack
/// height equal to the rounded total.
pub fn stack_rows(values: &[f64; 5], max: f64, height: u16) -> [u16; 5] {
    let mut rows = [0u16; 5];
    if max <= 0.0 || height == 0 {
        return rows;
    }

    let mut running = 0.0;
    let mut drawn = 0u16;
    for (i, value) in values.iter().enumerate() {
        running += value.max(0.0);
        let top = ((running / max) * height as f64).round().min(height as f64) as u16;
        rows[i] = top.saturating_sub(drawn);
        drawn = drawn.max(top);
    }
    rows
}

/// Stacked bar chart view for one report
pub struct RevenueChart<'a> {
    report: &'a RevenueReport,
    user_label: &'a str,
    theme: Theme,
}

impl<'a> RevenueChart<'a> {
    pub fn new(report: &'a RevenueReport, user_label: &'a str, theme: Theme) -> Self {
        Self {
            report,
            user_label,
            theme,
        }
    }
}

impl Widget for RevenueChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
            return;
        }

        let content_width = area.width.min(MAX_CONTENT_WIDTH);
        let x_offset = (area.width.saturating_sub(content_width)) / 2;
        let centered_area = Rect {
            x: area.x + x_offset,
            y: area.y,
            width: content_width,
            height: area.height,
        };

        let chunks = Layout::vertical([
            Constraint::Length(1), // Top padding
            Constraint::Length(1), // Title
            Constraint::Length(1), // Separator
            Constraint::Min(4),    // Bars
            Constraint::Length(1), // Day labels
            Constraint::Length(1), // Legend
            Constraint::Length(1), // Separator
            Constraint::Length(1), // Keybindings
        ])
        .split(centered_area);

        self.render_title(chunks[1], buf);
        self.render_separator(chunks[2], buf);
        self.render_bars(chunks[3], buf);
        self.render_day_labels(chunks[4], buf);
        self.render_legend(chunks[5], buf);
        self.render_separator(chunks[6], buf);
        self.render_keybindings(chunks[7], buf);
    }
}

impl RevenueChart<'_> {
    fn slot_width(area: Rect) -> u16 {
        area.width / DayName::ALL.len() as u16
    }

    fn render_title(&self, area: Rect, buf: &mut Buffer) {
        let line = Line::from(vec![
            Span::styled(
                format!("Revenue · {}", self.user_label),
                Style::default()
                    .fg(self.theme.text())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("   Week total ", Style::default().fg(self.theme.muted())),
            Span::styled(
                format_currency(self.report.table.week_total()),
                Style::default().fg(self.theme.cost()),
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

    fn render_bars(&self, area: Rect, buf: &mut Buffer) {
        let slot = Self::slot_width(area);
        if slot == 0 || area.height < 2 {
            return;
        }
        let bar_width = slot.saturating_sub(2).clamp(1, MAX_BAR_WIDTH);
        // Top row is reserved for the total annotation
        let bar_height = area.height - 1;
        let max = self.report.table.max_day_total();
        let bottom = area.y + area.height - 1;

        for (i, (_, bucket)) in self.report.table.iter().enumerate() {
            let slot_x = area.x + i as u16 * slot;
            let bar_x = slot_x + (slot - bar_width) / 2;

            let values = Category::ALL.map(|c| bucket.get(c));
            let rows = stack_rows(&values, max, bar_height);

            let mut y = bottom;
            let mut stacked = 0u16;
            for (category, count) in Category::ALL.iter().zip(rows) {
                let style = Style::default().fg(self.theme.category(*category));
                for _ in 0..count {
                    buf.set_string(bar_x, y, BAR_CELL.repeat(bar_width as usize), style);
                    y = y.saturating_sub(1);
                }
                stacked += count;
            }
            if stacked == 0 {
                buf.set_string(
                    bar_x,
                    bottom,
                    BASELINE_CELL.repeat(bar_width as usize),
                    Style::default().fg(self.theme.muted()),
                );
            }

            // Total annotation just above the bar
            let total = bucket.total();
            let full = format_currency(total);
            let label = if full.len() as u16 <= slot {
                full
            } else {
                format_compact_currency(total)
            };
            let label: String = label.chars().take(slot as usize).collect();
            let label_y = bottom.saturating_sub(stacked.max(1)).max(area.y);
            let label_x = slot_x + slot.saturating_sub(label.chars().count() as u16) / 2;
            buf.set_string(
                label_x,
                label_y,
                &label,
                Style::default().fg(self.theme.cost()),
            );
        }
    }

    fn render_day_labels(&self, area: Rect, buf: &mut Buffer) {
        let slot = Self::slot_width(area);
        if slot == 0 || area.height == 0 {
            return;
        }
        for (i, day) in DayName::ALL.iter().enumerate() {
            let label = if slot as usize >= day.name().len() + 1 {
                day.name()
            } else {
                day.short()
            };
            let label: String = label.chars().take(slot as usize).collect();
            let x = area.x + i as u16 * slot + slot.saturating_sub(label.len() as u16) / 2;
            buf.set_string(x, area.y, &label, Style::default().fg(self.theme.day()));
        }
    }

    fn render_legend(&self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::new();
        for (i, category) in Category::ALL.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("  "));
            }
            spans.push(Span::styled(
                "■ ",
                Style::default().fg(self.theme.category(*category)),
            ));
            spans.push(Span::styled(
                category.label(),
                Style::default().fg(self.theme.text()),
            ));
        }
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(area, buf);
    }

    fn render_keybindings(&self, area: Rect, buf: &mut Buffer) {
        let key = Style::default().fg(self.theme.accent());
        let hint = Style::default().fg(self.theme.muted());
        let line = Line::from(vec![
            Span::styled("Esc", key),
            Span::styled(" back  ", hint),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RevenueTable;

    fn render_to_string(report: &RevenueReport, width: u16, height: u16) -> (Buffer, String) {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        RevenueChart::new(report, "Ada Lovelace", Theme::Dark).render(area, &mut buf);
        let content: String = buf.content().iter().map(|c| c.symbol()).collect();
        (buf, content)
    }

    // ========== format_currency ==========

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(10.0), "$10.00");
        assert_eq!(format_currency(1234.5), "$1,234.50");
        assert_eq!(format_currency(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_currency(0.005), "$0.01");
        assert_eq!(format_currency(-2.5), "-$2.50");
    }

    #[test]
    fn test_format_compact_currency() {
        assert_eq!(format_compact_currency(12.4), "$12");
        assert_eq!(format_compact_currency(1_250.0), "$1.2k");
        assert_eq!(format_compact_currency(3_400_000.0), "$3.4M");
    }

    // ========== stack_rows ==========

    #[test]
    fn test_stack_rows_zero_max() {
        assert_eq!(stack_rows(&[1.0, 2.0, 0.0, 0.0, 0.0], 0.0, 10), [0; 5]);
    }

    #[test]
    fn test_stack_rows_full_height_for_max() {
        let rows = stack_rows(&[5.0, 5.0, 0.0, 0.0, 0.0], 10.0, 10);
        assert_eq!(rows, [5, 5, 0, 0, 0]);
    }

    #[test]
    fn test_stack_rows_sum_matches_rounded_total() {
        let values = [1.0, 1.0, 1.0, 0.0, 0.0];
        let rows = stack_rows(&values, 9.0, 10);
        let total: u16 = rows.iter().sum();
        assert_eq!(total, ((3.0 / 9.0) * 10.0_f64).round() as u16);
    }

    #[test]
    fn test_stack_rows_never_exceed_height() {
        let rows = stack_rows(&[10.0, 10.0, 10.0, 10.0, 10.0], 50.0, 7);
        assert_eq!(rows.iter().sum::<u16>(), 7);
    }

    // ========== rendering ==========

    #[test]
    fn test_render_all_zero_report() {
        let report = RevenueReport::new("1", RevenueTable::new());
        let (_, content) = render_to_string(&report, 100, 20);

        assert!(content.contains("Ada Lovelace"));
        assert!(content.contains("$0.00"));
        assert!(content.contains("Wednesday"));
        assert!(content.contains("Invoices"));
        assert!(!content.contains(BAR_CELL));
        assert!(content.contains(BASELINE_CELL));
    }

    #[test]
    fn test_render_tallest_bar_fills_height() {
        let mut table = RevenueTable::new();
        table
            .day_mut(DayName::Wednesday)
            .add(Category::Invoices, 20.0);
        table.day_mut(DayName::Monday).add(Category::Emails, 10.0);
        let report = RevenueReport::new("1", table);
        let (buf, content) = render_to_string(&report, 70, 20);

        assert!(content.contains("$20.00"));
        assert!(content.contains("$10.00"));

        // Wednesday is slot 3 of 10 columns; bar column at slot start + 1
        let bar_x = 3 * 10 + 1;
        let bar_cells = (0..20)
            .filter(|&y| buf.cell((bar_x, y)).map(|c| c.symbol()) == Some(BAR_CELL))
            .count();
        let monday_cells = (0..20)
            .filter(|&y| buf.cell((10 + 1, y)).map(|c| c.symbol()) == Some(BAR_CELL))
            .count();
        assert!(bar_cells > 0);
        assert_eq!(monday_cells * 2, bar_cells);
    }

    #[test]
    fn test_render_narrow_area_uses_short_day_names() {
        let report = RevenueReport::new("1", RevenueTable::new());
        let (_, content) = render_to_string(&report, 35, 12);
        assert!(content.contains("Wed"));
        assert!(!content.contains("Wednesday"));
    }

    #[test]
    fn test_render_tiny_area_does_not_panic() {
        let report = RevenueReport::new("1", RevenueTable::new());
        render_to_string(&report, 5, 3);
    }
}
