pub mod wheel_canvas;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};

use crate::app::{App, AppState};
use crate::session::Mode;
use wheel_canvas::{rgb, WheelCanvas};

const SIDEBAR_WIDTH: u16 = 28;
const PANEL_WIDTH: u16 = 34;
const KEY_HELP: &str = "s spin · p points · c chosen once · r reset · e edit · q quit";

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(area);

        let title = match &self.welcome {
            Some(welcome) => Line::from(vec![
                Span::styled("Spin the Wheel", bold_style),
                Span::raw("  "),
                Span::styled(welcome.as_str(), Style::default().fg(Color::Cyan)),
            ]),
            None => Line::from(Span::styled("Spin the Wheel", bold_style)),
        };
        Paragraph::new(title)
            .alignment(Alignment::Center)
            .render(rows[0], buf);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(SIDEBAR_WIDTH),
                Constraint::Min(10),
                Constraint::Length(PANEL_WIDTH),
            ])
            .split(rows[1]);

        render_sidebar(self, columns[0], buf);

        let names = self.engine.wheel_names();
        let frame = self.engine.frame(self.now);
        let highlight = if frame.animating {
            None
        } else {
            self.highlight.as_ref().and_then(|sel| sel.slot_in(&names))
        };
        WheelCanvas {
            names: &names,
            frame,
            highlight,
            title: " Wheel ",
        }
        .render(columns[1], buf);

        render_panel(self, columns[2], buf);

        Paragraph::new(Span::styled(KEY_HELP, dim_style))
            .alignment(Alignment::Center)
            .render(rows[2], buf);
    }
}

fn render_sidebar(app: &App, area: Rect, buf: &mut Buffer) {
    let stats = app.engine.stats();
    let (title, empty) = match stats.mode {
        Mode::Points => (" Leaderboard ", "No winners yet"),
        Mode::ChosenOnce => (" Chosen ", "Nobody chosen yet"),
    };

    let lines: Vec<Line> = if stats.ranking.is_empty() {
        vec![Line::from(Span::styled(
            empty,
            Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
        ))]
    } else {
        stats
            .ranking
            .iter()
            .map(|row| match stats.mode {
                Mode::Points => Line::from(vec![
                    Span::styled(format!("{:>2}. ", row.rank), Style::default().fg(Color::Yellow)),
                    Span::styled(row.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(format!(
                        "  {} {} · {} pts",
                        row.count,
                        if row.count == 1 { "win" } else { "wins" },
                        row.points
                    )),
                ]),
                Mode::ChosenOnce => Line::from(vec![
                    Span::styled(format!("{:>2}. ", row.rank), Style::default().fg(Color::Yellow)),
                    Span::raw(row.name.clone()),
                ]),
            })
            .collect()
    };

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .render(area, buf);
}

fn render_panel(app: &App, area: Rect, buf: &mut Buffer) {
    let stats = app.engine.stats();
    let editor_open = app.state == AppState::EditingNames;
    let show_draft = editor_open || !app.engine.names_loaded();

    let mut constraints = vec![Constraint::Length(3)];
    if stats.mode == Mode::ChosenOnce {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Length(3));
    if show_draft {
        constraints.push(Constraint::Min(4));
    } else {
        constraints.push(Constraint::Min(0));
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);
    let mut slot = chunks.iter().copied();

    let mode_line = Line::from(vec![
        Span::raw("Mode: "),
        Span::styled(
            stats.mode.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
    ]);
    if let Some(rect) = slot.next() {
        Paragraph::new(mode_line)
            .block(Block::default().borders(Borders::ALL))
            .render(rect, buf);
    }

    if stats.mode == Mode::ChosenOnce {
        if let Some(rect) = slot.next() {
            Gauge::default()
                .block(Block::default().borders(Borders::ALL))
                .gauge_style(Style::default().fg(Color::Green))
                .ratio(stats.progress.clamp(0.0, 1.0))
                .label(format!(
                    "Users remaining: {} / {}",
                    stats.remaining, stats.total
                ))
                .render(rect, buf);
        }
    }

    let selected = match (&app.flash, &app.highlight) {
        (Some((name, _)), _) => Line::from(Span::styled(
            format!("🎉 {name}"),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
        )),
        (None, Some(sel)) => Line::from(Span::styled(
            sel.name.clone(),
            Style::default().fg(rgb(sel.color)).add_modifier(Modifier::BOLD),
        )),
        (None, None) if app.engine.is_spinning() => Line::from(Span::styled(
            "Spinning…",
            Style::default().add_modifier(Modifier::ITALIC),
        )),
        (None, None) => Line::from(Span::styled(
            "Press s to spin",
            Style::default().add_modifier(Modifier::DIM),
        )),
    };
    if let Some(rect) = slot.next() {
        Paragraph::new(selected)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Selected "))
            .render(rect, buf);
    }

    let Some(rect) = slot.next() else {
        return;
    };
    let mut lines = Vec::new();
    if let Some(notice) = &app.notice {
        lines.push(Line::from(Span::styled(
            notice.as_str(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }
    if show_draft {
        let draft_style = if editor_open {
            Style::default().fg(Color::White)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        let cursor = if editor_open { "▏" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(app.draft.as_str(), draft_style),
            Span::raw(cursor),
        ]));
        lines.push(Line::from(Span::styled(
            if editor_open {
                "Enter load · Esc cancel · Tab separator"
            } else {
                "e to edit names"
            },
            Style::default().add_modifier(Modifier::DIM),
        )));
    }
    let title = if show_draft { " Names " } else { "" };
    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title))
        .render(rect, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SpinEngine;
    use crate::selector::ScriptedSelector;
    use crate::wheel::SpinSettings;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::time::{Duration, Instant};

    fn create_test_app(picks: &[usize]) -> App {
        let engine = SpinEngine::new(SpinSettings::default())
            .with_selector(Box::new(ScriptedSelector::new(picks.to_vec())));
        App::new(
            engine,
            "Shruti, Naman, Keta".into(),
            Some("Welcome back! This is visit #3".into()),
            Instant::now(),
        )
    }

    fn rendered(app: &App, area: Rect) -> String {
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    fn press(app: &mut App, c: char, now: Instant) {
        app.on_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE), now);
    }

    #[test]
    fn test_idle_render_shows_labels_and_welcome() {
        let app = create_test_app(&[]);
        let out = rendered(&app, Rect::new(0, 0, 120, 30));
        assert!(out.contains("Welcome back! This is visit #3"));
        assert!(out.contains("Shruti"));
        assert!(out.contains("No winners yet"));
        assert!(out.contains("Mode: Points"));
    }

    #[test]
    fn test_settled_render_shows_winner_and_leaderboard() {
        let mut app = create_test_app(&[1]);
        let t0 = app.now;
        press(&mut app, 's', t0);
        app.on_tick(t0 + Duration::from_secs(4));

        let out = rendered(&app, Rect::new(0, 0, 120, 30));
        assert!(out.contains("Naman"));
        assert!(out.contains("1 win · 5 pts"));
    }

    #[test]
    fn test_chosen_once_shows_progress_gauge() {
        let mut app = create_test_app(&[0]);
        let t0 = app.now;
        press(&mut app, 'c', t0);
        press(&mut app, 's', t0);
        app.on_tick(t0 + Duration::from_secs(4));

        let out = rendered(&app, Rect::new(0, 0, 120, 30));
        assert!(out.contains("Chosen Once"));
        assert!(out.contains("Users remaining: 2 / 3"));
    }

    #[test]
    fn test_labels_hidden_mid_spin() {
        let mut app = create_test_app(&[0]);
        let t0 = app.now;
        press(&mut app, 's', t0);
        app.on_tick(t0 + Duration::from_millis(50));
        app.on_tick(t0 + Duration::from_millis(500));

        let out = rendered(&app, Rect::new(0, 0, 120, 30));
        assert!(out.contains("Spinning"));
        assert!(!out.contains("Keta"));
    }

    #[test]
    fn test_different_aspect_ratios() {
        let app = create_test_app(&[]);
        for area in [
            Rect::new(0, 0, 200, 5),
            Rect::new(0, 0, 20, 50),
            Rect::new(0, 0, 50, 50),
            Rect::new(0, 0, 1, 1),
        ] {
            let mut buffer = Buffer::empty(area);
            (&app).render(area, &mut buffer);
            assert!(*buffer.area() == area);
        }
    }
}
