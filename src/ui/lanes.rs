use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Widget},
};
use unicode_width::UnicodeWidthStr;

use keyrunner::{
    game::Game,
    track::{EXIT_SPAN, PLAYER_SPAN},
    wave::{Slot, SLOT_COUNT},
};

const OBSTACLE: &str = "█████";

/// The three lanes with their letters, falling obstacles, bonus letters and
/// the player marker.
pub struct Lanes<'a> {
    pub game: &'a Game,
}

/// Row inside `height` rows for a lane position in `0..=1 + EXIT_SPAN/PLAYER_SPAN`.
pub fn row_for(progress: f64, height: u16) -> u16 {
    if height == 0 {
        return 0;
    }
    let exit = 1.0 + EXIT_SPAN as f64 / PLAYER_SPAN as f64;
    let last = (height - 1) as f64;
    ((progress / exit).clamp(0.0, 1.0) * last).round() as u16
}

/// Row where obstacles meet the player
pub fn player_row(height: u16) -> u16 {
    row_for(1.0, height)
}

fn lane_rect(inner: Rect, slot: Slot) -> Rect {
    let width = inner.width / SLOT_COUNT as u16;
    Rect::new(inner.x + width * slot as u16, inner.y, width, inner.height)
}

fn centered(buf: &mut Buffer, lane: Rect, y: u16, text: &str, style: Style) {
    let w = text.width() as u16;
    let x = lane.x + lane.width.saturating_sub(w) / 2;
    buf.set_stringn(x, y, text, lane.width as usize, style);
}

impl Widget for Lanes<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::LEFT | Borders::RIGHT);
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height < 3 || inner.width < SLOT_COUNT as u16 {
            return;
        }

        let game = self.game;
        let now = game.play_ms();
        // row 0 carries the lane letters, the track starts below it
        let track = Rect::new(inner.x, inner.y + 1, inner.width, inner.height - 1);
        let dim = Style::default().add_modifier(Modifier::DIM);

        for slot in 1..SLOT_COUNT {
            let x = lane_rect(inner, slot).x;
            for y in inner.y..inner.y + inner.height {
                buf.set_string(x, y, "│", dim);
            }
        }

        if let Some(wave) = game.wave() {
            for slot in 0..SLOT_COUNT {
                let ch = wave.letter_at(slot);
                let style = if slot == wave.safe_slot {
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                };
                centered(buf, lane_rect(inner, slot), inner.y, &ch.to_string(), style);
            }
        }

        for ob in game.obstacles() {
            let y = track.y + row_for(ob.progress(now), track.height);
            let lane = lane_rect(track, ob.slot);
            centered(buf, lane, y, OBSTACLE, Style::default().fg(Color::Red));
        }

        for item in game.bonus_items() {
            let y = track.y + row_for(item.progress(now), track.height);
            let lane = lane_rect(track, item.slot);
            centered(
                buf,
                lane,
                y,
                &format!("[{}]", item.ch),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            );
        }

        let y = track.y + player_row(track.height);
        let lane = lane_rect(track, game.run().player_slot);
        centered(
            buf,
            lane,
            y,
            &game.config().character.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        );
    }
}
