#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::App;
use crate::components::{GameSession, Mineral, Position};
use crate::game;

pub fn render(f: &mut Frame, app: &mut App) {
    let min_width = 40u16;
    let min_height = 16u16;

    if f.area().width < min_width || f.area().height < min_height {
        let warning = Paragraph::new(
            "Terminal too small!\nPlease resize your terminal\nto continue playing.",
        )
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Mineralfall - Paused"),
        );
        let warning_area = centered_rect(60, 40, f.area());
        f.render_widget(warning, warning_area);
        app.playfield = None;
        return;
    }

    if crate::config::current().show_hud {
        let main_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(24), Constraint::Length(26)])
            .split(f.area());

        render_playfield(f, app, main_layout[0]);
        render_info(f, app, main_layout[1]);
    } else {
        render_playfield(f, app, f.area());
    }
}

fn render_playfield(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("MINERALFALL");
    let inner = block.inner(area);
    f.render_widget(block, area);

    // Pointer mapping and the surface the game simulates both follow the
    // playfield geometry of this frame.
    app.playfield = Some(inner);
    app.set_surface(
        f32::from(inner.width) * game::CELL_PIXEL_WIDTH,
        f32::from(inner.height) * game::CELL_PIXEL_HEIGHT,
    );

    let minerals: Vec<(Mineral, Position)> = app
        .world
        .query::<(&Mineral, &Position)>()
        .iter(&app.world)
        .map(|(mineral, position)| (mineral.clone(), *position))
        .collect();

    for (mineral, position) in minerals {
        if position.y < 0.0 {
            continue;
        }
        let col = (position.x / game::CELL_PIXEL_WIDTH) as u16;
        let row = (position.y / game::CELL_PIXEL_HEIGHT) as u16;
        if col >= inner.width || row >= inner.height {
            continue;
        }
        let cell_x = inner.left() + col;
        let cell_y = inner.top() + row;
        if let Some(cell) = f.buffer_mut().cell_mut((cell_x, cell_y)) {
            cell.set_symbol(&mineral.kind.sprite);
            cell.set_fg(value_color(mineral.kind.value));
        }
    }

    if app.is_over() {
        render_summary_overlay(f, app, inner);
    }
}

fn render_info(f: &mut Frame, app: &mut App, area: Rect) {
    let info_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(6), // Stats
            Constraint::Min(4),    // Status and controls
        ])
        .split(area);

    let title = Paragraph::new("INFO")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(title, info_layout[0]);

    let (score, time_remaining, level) = {
        let session = app.world.resource::<GameSession>();
        (
            session.score,
            session.time_remaining,
            session.level.config.level,
        )
    };

    let player = app
        .identity
        .as_ref()
        .map_or_else(|| "guest".to_string(), |id| id.display_name.clone());

    let stats = format!(
        "Player: {player}\nLevel: {level}\nScore: {score}\nTime: {time_remaining}s"
    );
    let stats_widget = Paragraph::new(stats)
        .block(Block::default().borders(Borders::NONE))
        .wrap(Wrap { trim: true });
    f.render_widget(stats_widget, info_layout[1]);

    let mut status_lines: Vec<Line> = Vec::new();
    if app.is_over() {
        status_lines.push(Line::styled(
            "ROUND OVER",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
        status_lines.push(Line::raw("Enter: play again"));
    }
    if app.save_failed() {
        status_lines.push(Line::styled(
            "Could not save this round's rewards",
            Style::default().fg(Color::Yellow),
        ));
    }
    status_lines.push(Line::raw(""));
    status_lines.push(Line::raw("Click minerals to collect"));
    status_lines.push(Line::raw("Q: quit"));

    let status = Paragraph::new(status_lines)
        .block(Block::default().borders(Borders::TOP))
        .wrap(Wrap { trim: true });
    f.render_widget(status, info_layout[2]);
}

fn render_summary_overlay(f: &mut Frame, app: &App, area: Rect) {
    let Some(summary) = &app.last_summary else {
        return;
    };

    let mut lines = vec![
        Line::styled(
            "ROUND OVER",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Line::raw(format!("Final score: {}", summary.final_score)),
    ];
    for (symbol, entry) in &summary.collected {
        lines.push(Line::raw(format!(
            "{symbol} x{} ({} each)",
            entry.count, entry.unit_value
        )));
    }
    if summary.collected.is_empty() {
        lines.push(Line::raw("Nothing collected"));
    }

    let height = (lines.len() as u16 + 2).min(area.height);
    let overlay_area = Rect {
        x: area.x + area.width.saturating_sub(30) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: 30.min(area.width),
        height,
    };

    let overlay = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Summary"));
    f.render_widget(Clear, overlay_area);
    f.render_widget(overlay, overlay_area);
}

fn value_color(value: u32) -> Color {
    if value >= 50 {
        Color::Yellow
    } else if value >= 20 {
        Color::LightMagenta
    } else if value >= 10 {
        Color::LightCyan
    } else if value >= 5 {
        Color::LightGreen
    } else {
        Color::White
    }
}

/// Helper function to create a centered rect using up certain percentage of the available rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
