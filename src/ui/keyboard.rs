use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use keyrunner::keys::{BOTTOM_ROW, HOME_ROW, TOP_ROW};

/// On-screen keyboard with the active pool bright and the target lit up
pub struct Keyboard<'a> {
    pub pool: &'a [char],
    pub highlight: Option<char>,
}

impl Keyboard<'_> {
    fn row(&self, keys: &[char], indent: usize) -> Line<'static> {
        let mut spans = vec![Span::raw(" ".repeat(indent))];
        for &k in keys {
            let style = if Some(k) == self.highlight {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else if self.pool.contains(&k) {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            spans.push(Span::styled(format!(" {k} "), style));
            spans.push(Span::raw(" "));
        }
        Line::from(spans)
    }
}

impl Widget for Keyboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = vec![
            self.row(&TOP_ROW, 0),
            self.row(&HOME_ROW, 1),
            self.row(&BOTTOM_ROW, 2),
        ];
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}
