use maple_conversation::{format_message_time, ChatView, HistoryRow, Severity, Strings};
use maple_core::{Message, Sender};
use maple_gateway::Connector;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, ConnectionStatus};
use crate::markup::markup_to_text;

const HELP: &str =
    "[Enter] Send  [Ctrl+R] Region  [Ctrl+L] Language  [Tab] History  [↑/↓] Browse  [Ctrl+G] Live  [Ctrl+O] Reload  [Esc] Quit";

pub fn draw<C: Connector>(f: &mut Frame, app: &App<C>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // History + messages
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status bar
        ])
        .split(f.size());

    let view = app.controller.chat_view();

    draw_header(f, app, chunks[0]);
    if app.controller.show_history() {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(chunks[1]);
        draw_history(f, app, body[0]);
        draw_messages(f, app, &view, body[1]);
    } else {
        draw_messages(f, app, &view, chunks[1]);
    }
    draw_input(f, app, &view, chunks[2]);
    draw_status_bar(f, app, chunks[3]);
}

fn draw_header<C: Connector>(f: &mut Frame, app: &App<C>, area: Rect) {
    let s = Strings::for_language(app.controller.language());
    let status = app.status();
    let status_color = match status {
        ConnectionStatus::Idle => Color::Gray,
        ConnectionStatus::Connecting => Color::Yellow,
        ConnectionStatus::Live => Color::Green,
        ConnectionStatus::Waiting => Color::Cyan,
    };
    let separator = || Span::styled("  |  ", Style::default().fg(Color::Gray));

    let header_text = Line::from(vec![
        Span::raw(" 🍁 "),
        Span::styled(
            "Maple Chat",
            Style::default().add_modifier(Modifier::BOLD).fg(Color::Red),
        ),
        separator(),
        Span::styled(format!("{}: ", s.region), Style::default().fg(Color::Gray)),
        Span::styled(
            app.controller.region().label(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        separator(),
        Span::styled(format!("{}: ", s.language), Style::default().fg(Color::Gray)),
        Span::styled(
            app.controller.language().label(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        separator(),
        Span::styled(status.to_string(), Style::default().fg(status_color)),
    ]);

    let header = Paragraph::new(header_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .alignment(Alignment::Left);

    f.render_widget(header, area);
}

fn draw_history<C: Connector>(f: &mut Frame, app: &App<C>, area: Rect) {
    let s = Strings::for_language(app.controller.language());
    let rows = app.controller.history_rows();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(s.history_heading)
        .border_style(Style::default().fg(Color::Blue));

    if rows.is_empty() {
        let text = Text::from(vec![
            Line::from(""),
            Line::from(Span::styled(
                s.history_empty_title,
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                s.history_empty_hint,
                Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            )),
        ]);
        let empty = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = rows.iter().map(|row| history_item(row, s)).collect();
    let mut state = ListState::default();
    state.select(rows.iter().position(|row| row.is_selected));

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(list, area, &mut state);
}

fn history_item(row: &HistoryRow, s: &Strings) -> ListItem<'static> {
    let live_style = Style::default().fg(Color::Green);
    let mut title = Vec::new();
    if row.is_live {
        title.push(Span::styled("● ", live_style));
    }
    title.push(Span::styled(
        row.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    if row.is_live {
        title.push(Span::styled(format!(" ({})", s.live), live_style));
    }

    ListItem::new(vec![
        Line::from(title),
        Line::from(Span::styled(
            format!("  {} · {}", row.start_label(), row.region.label()),
            Style::default().fg(Color::DarkGray),
        )),
    ])
}

fn draw_messages<C: Connector>(f: &mut Frame, app: &App<C>, view: &ChatView<'_>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Messages")
        .border_style(Style::default().fg(Color::Blue));
    let activity = view.activity.map(|text| {
        Line::from(Span::styled(
            text,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ))
    });

    if let Some((title, hint)) = view.empty_state {
        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
            Line::from(Span::styled(hint, Style::default().fg(Color::Gray))),
        ];
        if let Some(activity) = activity {
            lines.push(Line::from(""));
            lines.push(activity);
        }
        let empty = Paragraph::new(Text::from(lines))
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(empty, area);
        return;
    }

    let mut lines: Vec<Line> = view.messages.iter().flat_map(format_message).collect();
    lines.extend(activity);

    // Pin to the bottom; scroll_offset counts rows up from there.
    let inner_width = area.width.saturating_sub(2).max(1);
    let visible = area.height.saturating_sub(2);
    let total: u16 = lines
        .iter()
        .map(|line| wrapped_height(line, inner_width))
        .fold(0u16, u16::saturating_add);
    let top = total.saturating_sub(visible).saturating_sub(app.scroll_offset);

    let messages = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((top, 0));

    f.render_widget(messages, area);
}

fn wrapped_height(line: &Line, width: u16) -> u16 {
    let w = line.width() as u16;
    w.div_ceil(width).max(1)
}

fn format_message(msg: &Message) -> Vec<Line<'static>> {
    let (prefix, style) = match msg.sender {
        Sender::User => ("👤 You", Style::default().fg(Color::Cyan)),
        Sender::Bot => ("🍁 Bot", Style::default().fg(Color::Green)),
    };
    let body = match msg.sender {
        Sender::User => msg.text.clone(),
        Sender::Bot => markup_to_text(&msg.text),
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(prefix, style.add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("  {}", format_message_time(msg.timestamp)),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ),
    ])];
    for text in body.lines() {
        lines.push(Line::from(vec![
            Span::raw("   "),
            Span::styled(text.to_string(), style),
        ]));
    }
    lines.push(Line::from(""));
    lines
}

fn draw_input<C: Connector>(f: &mut Frame, app: &App<C>, view: &ChatView<'_>, area: Rect) {
    let enabled = view.input.is_enabled();
    let accent = if enabled { Color::Green } else { Color::DarkGray };

    let input_text = if enabled && !app.input.is_empty() {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(accent)),
            Span::styled(app.input.as_str(), Style::default().fg(Color::White)),
            Span::styled("▌", Style::default().fg(accent)),
        ])
    } else {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(accent)),
            Span::styled(
                view.placeholder,
                Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            ),
        ])
    };

    let input = Paragraph::new(input_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("[Enter] {}", view.send_label))
                .border_style(Style::default().fg(if enabled { Color::Blue } else { Color::DarkGray })),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(input, area);
}

fn draw_status_bar<C: Connector>(f: &mut Frame, app: &App<C>, area: Rect) {
    let language = app.controller.language();

    let status_bar = match app.toasts.back() {
        Some(toast) => {
            let color = match toast.notice.severity() {
                Severity::Info => Color::Blue,
                Severity::Warning => Color::Yellow,
                Severity::Error => Color::Red,
            };
            let text = format!(
                " {}: {}",
                toast.notice.title(language),
                toast.notice.description(language)
            );
            Paragraph::new(text)
                .alignment(Alignment::Left)
                .style(Style::default().fg(color).add_modifier(Modifier::REVERSED))
        }
        None => Paragraph::new(HELP)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray).add_modifier(Modifier::REVERSED)),
    };

    f.render_widget(status_bar, area);
}
