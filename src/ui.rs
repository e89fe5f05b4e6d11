//! TUI rendering: search field, consent banner, weather card and the hourly
//! forecast table.

use crate::app::{App, Focus};
use crate::fetcher::FetchState;
use crate::models::WeatherSnapshot;
use crate::resolver::ResolverState;
use ratatui::{prelude::*, widgets::*};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Renders one frame from the current application state.
pub fn render(f: &mut Frame, app: &App) {
    let banner_height = if banner_lines(app).is_some() { 4 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(banner_height),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.size());

    let title = Paragraph::new(" Weather Now ")
        .style(Style::default().add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    render_search(f, app, chunks[1]);
    if let Some((lines, color)) = banner_lines(app) {
        let banner = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(color)),
            );
        f.render_widget(banner, chunks[2]);
    }
    render_weather(f, app, chunks[3]);
    render_help(f, app, chunks[4]);
}

fn render_search(f: &mut Frame, app: &App, area: Rect) {
    let border = if app.focus == Focus::Search {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let input = Paragraph::new(app.input.as_str()).block(
        Block::default()
            .title(" Enter city name ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border),
    );
    f.render_widget(input, area);

    if app.focus == Focus::Search {
        f.set_cursor(cursor_x(area, &app.input), area.y.saturating_add(1));
    }
}

// Column just past the typed text, measured in display cells and kept inside
// the box border.
fn cursor_x(area: Rect, input: &str) -> u16 {
    let inner_width = area.width.saturating_sub(2);
    let offset = Line::from(input)
        .width()
        .min(inner_width.saturating_sub(1) as usize) as u16;
    area.x.saturating_add(1).saturating_add(offset)
}

// Consent prompt, locating notice or the denied banner; nothing otherwise.
fn banner_lines(app: &App) -> Option<(Vec<Line<'static>>, Color)> {
    if app.resolver.is_locating() {
        return Some((
            vec![Line::from(format!(
                " {} Detecting your location...",
                spinner_frame(app)
            ))],
            Color::Cyan,
        ));
    }

    match app.resolver.state() {
        ResolverState::PromptPending => Some((
            vec![
                Line::from(" Use your current location for the forecast?"),
                Line::from(vec![
                    Span::styled(" [y] ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                    Span::raw("Allow   "),
                    Span::styled("[n] ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                    Span::raw("No thanks, I'll search"),
                ]),
            ],
            Color::Yellow,
        )),
        ResolverState::Denied => Some((
            vec![
                Line::from(" Location access is off. Search for a city instead."),
                Line::from(vec![
                    Span::styled(" [t] ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                    Span::raw("Try again"),
                ]),
            ],
            Color::DarkGray,
        )),
        _ => None,
    }
}

fn render_weather(f: &mut Frame, app: &App, area: Rect) {
    match app.fetcher.state() {
        FetchState::Idle => {
            let p = Paragraph::new("Search for a city to see the weather.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray));
            f.render_widget(p, area);
        }
        FetchState::Loading => {
            let p = Paragraph::new(format!("{} Loading weather...", spinner_frame(app)))
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Cyan));
            f.render_widget(p, area);
        }
        FetchState::Error(e) => {
            let p = Paragraph::new(e.user_message())
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Red)),
                );
            f.render_widget(p, area);
        }
        FetchState::Success(snapshot) => render_snapshot(f, snapshot, area),
    }
}

fn render_snapshot(f: &mut Frame, snap: &WeatherSnapshot, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    let current = &snap.current;
    let card = vec![
        Line::from(Span::styled(
            format!("{}°C", current.temp),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(current.conditions.as_str()),
        Line::from(Span::styled(
            format!(
                "Wind: {} km/h | Humidity: {}%",
                fmt_opt(current.wind_speed),
                fmt_opt(current.humidity)
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let card = Paragraph::new(card).block(
        Block::default()
            .title(format!(" {} ", snap.resolved_address))
            .title_alignment(Alignment::Left)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Blue))
            .padding(Padding::horizontal(1)),
    );
    f.render_widget(card, chunks[0]);

    let rows: Vec<Row> = snap
        .hours
        .iter()
        .map(|h| {
            Row::new(vec![
                h.label(),
                format!("{}°C", h.temp),
                h.conditions.clone(),
                format!("{}%", fmt_opt(h.humidity)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Length(9),
            Constraint::Min(12),
            Constraint::Length(8),
        ],
    )
    .header(
        Row::new(vec!["Time", "Temp", "Conditions", "Humidity"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .title(" Next 24-Hour Forecast ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(table, chunks[1]);
}

fn render_help(f: &mut Frame, app: &App, area: Rect) {
    let text = match app.focus {
        Focus::Search => " Enter search   Tab/Esc panel   Ctrl-C quit",
        Focus::Panel => " / or Tab search   r refresh   t reset location   q quit",
    };
    let help = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, area);
}

fn spinner_frame(app: &App) -> &'static str {
    SPINNER[app.tick_count % SPINNER.len()]
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "--".to_string(), |v| v.to_string())
}
