// SPDX-License-Identifier: MIT

//! Operator TUI, per spec §4.11/§6: a node table, a sidebar with BBS
//! identity/stats and recent callers, a status bar with the key legend,
//! and a transient popup overlay.
//!
//! `ratatui`/`crossterm` aren't in the teacher's own stack — they're
//! pulled in from the retrieval pack (`pproenca-agent-tui`,
//! `AgentWorkforce-relay`) for exactly this surface, per DESIGN.md. The
//! module stays in the teacher's texture otherwise: plain render
//! functions over borrowed state, no view-model layer.

use crate::callers::CallerRecord;
use crate::userinfo::{BbsStats, CurrentUser};
use bbsmux_core::node::NodeStatus;
use bbsmux_core::popup::PopupAlert;
use bbsmux_core::table::NodeTable;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table};
use ratatui::Frame;
use std::time::Instant;

/// Key legend shown in the status bar; also referenced by `supervisor`
/// when dispatching operator keystrokes.
pub const KEY_LEGEND: &str =
    "K kill  R restart  S snoop  C config  Tab select  Q quit  any key dismiss popup";

pub struct BbsIdentity {
    pub name: String,
    pub sysop: String,
}

/// Everything one frame needs to render. Built fresh by the supervisor
/// each tick from its own owned state — this module never retains
/// anything across calls.
pub struct DashboardView<'a> {
    pub identity: &'a BbsIdentity,
    pub stats: &'a BbsStats,
    pub current_user: Option<&'a CurrentUser>,
    pub callers: &'a [CallerRecord],
    pub popup: Option<&'a PopupAlert>,
    pub selected_node: u8,
    pub config_mode: bool,
}

pub fn draw(frame: &mut Frame, table: &NodeTable, view: &DashboardView, now: Instant) {
    let area = frame.area();

    if view.config_mode {
        draw_config_mode_banner(frame, area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);
    let body = rows[0];
    let status_bar = rows[1];

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(body);

    draw_node_table(frame, cols[0], table, view.selected_node, now);
    draw_sidebar(frame, cols[1], view);
    draw_status_bar(frame, status_bar);

    if let Some(popup) = view.popup {
        draw_popup(frame, area, popup);
    }
}

fn draw_node_table(frame: &mut Frame, area: Rect, table: &NodeTable, selected_node: u8, now: Instant) {
    let header = Row::new(vec!["Node", "State", "User", "Activity", "Session"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = table
        .iter()
        .map(|node| {
            let state_style = state_style(node.status);
            let session = node
                .connect_time
                .map(|t| format_duration(now.saturating_duration_since(t)))
                .unwrap_or_default();
            let row = Row::new(vec![
                Cell::from(format!("{:02}", node.node_num)),
                Cell::from(state_label(node.status)).style(state_style),
                Cell::from(node.username.clone().unwrap_or_default()),
                Cell::from(node.activity.clone().unwrap_or_default()),
                Cell::from(session),
            ]);
            if node.node_num == selected_node {
                row.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                row
            }
        })
        .collect();

    let widths =
        [Constraint::Length(5), Constraint::Length(10), Constraint::Length(16), Constraint::Min(10), Constraint::Length(9)];
    let widget = Table::new(rows, widths).header(header).block(Block::default().borders(Borders::ALL).title("Nodes"));
    frame.render_widget(widget, area);
}

fn draw_sidebar(frame: &mut Frame, area: Rect, view: &DashboardView) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(3)])
        .split(area);

    let mut lines = vec![
        Line::from(view.identity.name.clone()),
        Line::from(format!("sysop: {}", view.identity.sysop)),
        Line::from(format!("total calls: {}", view.stats.total_calls)),
        Line::from(format!("calls today: {}", view.stats.calls_today)),
    ];
    if let Some(user) = view.current_user {
        let label = user.alias.as_deref().unwrap_or(&user.name);
        lines.push(Line::from(format!("active: {label}")));
    }
    let identity = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("BBS"));
    frame.render_widget(identity, parts[0]);

    let items: Vec<ListItem> = view.callers.iter().rev().map(|c| ListItem::new(c.name.clone())).collect();
    let callers = List::new(items).block(Block::default().borders(Borders::ALL).title("Recent callers"));
    frame.render_widget(callers, parts[1]);
}

fn draw_status_bar(frame: &mut Frame, area: Rect) {
    let bar = Paragraph::new(KEY_LEGEND).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(bar, area);
}

fn draw_popup(frame: &mut Frame, area: Rect, popup: &PopupAlert) {
    let rect = centered_rect(60, 30, area);
    frame.render_widget(Clear, rect);
    let widget = Paragraph::new(vec![Line::from(Span::raw(popup.body.clone()))])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(popup.title.clone()).style(Style::default().fg(Color::Red)));
    frame.render_widget(widget, rect);
}

fn draw_config_mode_banner(frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new("Configuration editor running — supervisor paused its own display.")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Config mode"));
    frame.render_widget(widget, area);
}

fn state_label(status: NodeStatus) -> &'static str {
    match status {
        NodeStatus::Inactive => "INACTIVE",
        NodeStatus::Starting => "STARTING",
        NodeStatus::Wfc => "WFC",
        NodeStatus::Connected => "CONNECTED",
        NodeStatus::Stopping => "STOPPING",
        NodeStatus::Failed => "FAILED",
    }
}

fn state_style(status: NodeStatus) -> Style {
    match status {
        NodeStatus::Connected => Style::default().fg(Color::Green),
        NodeStatus::Failed => Style::default().fg(Color::Red),
        NodeStatus::Starting | NodeStatus::Stopping => Style::default().fg(Color::Yellow),
        _ => Style::default(),
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
#[path = "tui_tests.rs"]
mod tests;
