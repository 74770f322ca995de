//! Status dashboard rendered while the server runs in a terminal.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::Frame;

use trek::config::MAX_CLIENTS;

use crate::state::DashboardStats;

pub fn render(frame: &mut Frame, stats: &DashboardStats) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Min(0),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], stats);
    render_capacity(frame, chunks[1], stats);
    render_galaxy(frame, chunks[2], stats);
    render_help(frame, chunks[3]);
}

fn render_header(frame: &mut Frame, area: Rect, stats: &DashboardStats) {
    let title = format!(" Trek Galaxy Server - Uptime: {} ", format_duration(stats.uptime_secs));
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let text = format!(
        "Tick: {}  |  Frame: {}  |  Captains online: {}",
        stats.tick, stats.frame_id, stats.players_online
    );
    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .style(Style::default().fg(Color::White)),
        area,
    );
}

fn render_capacity(frame: &mut Frame, area: Rect, stats: &DashboardStats) {
    let block = Block::default()
        .title(" Sessions ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let ratio = stats.players_online as f64 / MAX_CLIENTS as f64;
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio.min(1.0))
        .label(format!(
            "{}/{} online ({} known captains)",
            stats.players_online, MAX_CLIENTS, stats.players_known
        ));
    frame.render_widget(gauge, area);
}

fn render_galaxy(frame: &mut Frame, area: Rect, stats: &DashboardStats) {
    let block = Block::default()
        .title(" Galaxy ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let supernova = match stats.supernova {
        Some((q, timer)) => format!(
            "ACTIVE in Q[{},{},{}], T-minus {}s",
            q.q1,
            q.q2,
            q.q3,
            timer / 30
        ),
        None => "none".to_string(),
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("Hostile ships: ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{}", stats.npcs_active), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Stars burning: ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{}", stats.stars_active), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Supernova: ", Style::default().fg(Color::Gray)),
            Span::styled(
                supernova,
                Style::default().fg(if stats.supernova.is_some() {
                    Color::Red
                } else {
                    Color::White
                }),
            ),
        ]),
        Line::from(vec![
            Span::styled("Traffic: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!(
                    "{} out / {} in ({} conns)",
                    format_bytes(stats.bytes_sent),
                    format_bytes(stats.bytes_received),
                    stats.connections_accepted
                ),
                Style::default().fg(Color::White),
            ),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    frame.render_widget(
        Paragraph::new("Press 'q' or ESC to quit").block(block).style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ),
        area,
    );
}

fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{}B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1}GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
