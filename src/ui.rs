pub mod keyboard;
pub mod lanes;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use keyrunner::{game::Game, leaderboard::ScoreRow, result::SessionResult};

use crate::{
    ui::{keyboard::Keyboard, lanes::Lanes},
    App, AppState, MenuField,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Menu => render_menu(self, area, buf),
            AppState::Playing => match &self.game {
                Some(game) => render_game(game, area, buf),
                None => render_menu(self, area, buf),
            },
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn score_lines(rows: &[ScoreRow]) -> Vec<Line<'static>> {
    if rows.is_empty() {
        return vec![Line::from(Span::styled("no scores yet", dim()))];
    }
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            Line::from(vec![
                Span::styled(format!("{:>2}. ", i + 1), dim()),
                Span::styled(format!("{:<16}", row.name), bold()),
                Span::raw(format!("{:>8}", row.score)),
            ])
        })
        .collect()
}

fn render_menu(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2), // title
            Constraint::Length(3), // settings
            Constraint::Length(1), // notice
            Constraint::Min(3),    // leaderboard
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(
        "keyrunner",
        Style::default().fg(Color::Cyan).patch(bold()),
    ))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    let field = |label: &str, value: String, selected: bool| {
        let marker = if selected { "▶ " } else { "  " };
        let style = if selected {
            Style::default().fg(Color::Green).patch(bold())
        } else {
            bold()
        };
        Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{label:<11}"), dim()),
            Span::styled(format!("◀ {value} ▶"), style),
        ])
    };
    let settings = vec![
        field(
            "mode",
            app.config.mode.to_string(),
            app.menu_field == MenuField::Mode,
        ),
        field(
            "difficulty",
            app.config.difficulty.to_string(),
            app.menu_field == MenuField::Difficulty,
        ),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("{:<11}", "player"), dim()),
            Span::raw(app.config.player_name.clone()),
        ]),
    ];
    Paragraph::new(settings)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    if let Some(notice) = &app.notice {
        Paragraph::new(Span::styled(notice.clone(), Style::default().fg(Color::Red)))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
    }

    let title = match app.last_played {
        Some(at) => format!("top scores · last run {}", at.format("%Y-%m-%d %H:%M")),
        None => "top scores".to_string(),
    };
    Paragraph::new(score_lines(&app.top_scores))
        .block(Block::default().borders(Borders::TOP).title(title))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        "(↑↓) select  (←→) change  (enter) start  (esc) quit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);
}

fn render_game(game: &Game, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(1), // hud
            Constraint::Min(4),    // lanes
            Constraint::Length(3), // keyboard
            Constraint::Length(1), // legend
        ])
        .split(area);

    let hud = game.hud();
    Paragraph::new(Line::from(vec![
        Span::styled(format!("{:.1}s", hud.elapsed_secs), bold()),
        Span::raw("   "),
        Span::styled(format!("{} letters", hud.correct), bold()),
        Span::raw("   "),
        Span::styled(
            format!("score {}", hud.score),
            Style::default().fg(Color::Magenta).patch(bold()),
        ),
        Span::raw("   "),
        Span::styled(
            match hud.time_left_ms {
                Some(left) => format!("{left}ms left / {}ms", hud.reaction_window_ms),
                None => format!("{}ms", hud.reaction_window_ms),
            },
            dim(),
        ),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    Lanes { game }.render(chunks[1], buf);

    Keyboard {
        pool: game.config().mode.pool(),
        highlight: game.highlight().filter(|_| !game.is_paused()),
    }
    .render(chunks[2], buf);

    let legend = if game.is_paused() {
        "(esc) resume  (enter) restart  (m) menu"
    } else {
        "(esc) pause"
    };
    Paragraph::new(Span::styled(
        legend,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    let overlay = if game.is_paused() {
        Some("PAUSED".to_string())
    } else {
        game.countdown_remaining().map(|n| n.to_string())
    };
    if let Some(text) = overlay {
        render_overlay(&text, chunks[1], buf);
    }
}

fn render_overlay(text: &str, area: Rect, buf: &mut Buffer) {
    let width = (text.chars().count() as u16 + 4).min(area.width);
    let height = 3.min(area.height);
    let rect = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );
    Clear.render(rect, buf);
    Paragraph::new(Span::styled(
        text.to_string(),
        Style::default().fg(Color::Yellow).patch(bold()),
    ))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center)
    .render(rect, buf);
}

fn summary_lines(result: &SessionResult) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            format!("game over: {}", result.reason),
            Style::default().fg(Color::Red).patch(bold()),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "{:.1}s   {} letters   {} bonus",
                result.elapsed_secs, result.letters_typed, result.bonus_score
            ),
            bold(),
        )),
        Line::from(Span::styled(
            format!("score {}", result.score),
            Style::default().fg(Color::Magenta).patch(bold()),
        )),
        Line::from(Span::styled(
            format!("{} / {}", result.mode, result.difficulty),
            dim(),
        )),
    ]
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(6), // summary
            Constraint::Min(3),    // leaderboard
            Constraint::Length(1), // legend
        ])
        .split(area);

    if let Some(result) = &app.last_result {
        Paragraph::new(summary_lines(result))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);
    }

    Paragraph::new(score_lines(&app.top_scores))
        .block(Block::default().borders(Borders::TOP).title("top scores"))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        "(enter) play again  (m) menu  (esc) quit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);
}
