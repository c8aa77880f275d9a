use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use concierge_session::{Connectivity, Message, Sender};

use crate::app::App;
use crate::markdown;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Messages
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status bar
        ])
        .split(f.size());

    draw_header(f, app, chunks[0]);
    if app.is_open() {
        draw_messages(f, app, chunks[1]);
    } else {
        draw_closed(f, chunks[1]);
    }
    draw_input(f, app, chunks[2]);
    draw_status_bar(f, app, chunks[3]);
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let connectivity = app.engine.connectivity();
    let status_color = match connectivity {
        Connectivity::Connected => Color::Green,
        Connectivity::Disconnected => Color::Red,
    };

    let mut spans = vec![
        Span::styled(" 🛎  ", Style::default()),
        Span::styled(
            "Four Seasons Concierge",
            Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan),
        ),
    ];
    if app.is_open() {
        spans.push(Span::styled("  |  ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            connectivity.to_string(),
            Style::default().fg(status_color),
        ));
        if app.is_connecting() {
            spans.push(Span::styled("  ◐ Connecting...", Style::default().fg(Color::Yellow)));
        } else if app.engine.is_sending() {
            spans.push(Span::styled("  ◐ Typing...", Style::default().fg(Color::Yellow)));
        }
    }

    let header = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .alignment(Alignment::Left);

    f.render_widget(header, area);
}

fn draw_closed(f: &mut Frame, area: Rect) {
    let text = Paragraph::new(Line::from(vec![
        Span::raw("The concierge is closed. Press "),
        Span::styled("Ctrl+O", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" to start a conversation."),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    f.render_widget(text, area);
}

fn draw_messages(f: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = app
        .messages()
        .iter()
        .flat_map(|msg| format_message(msg, app.rich_text()))
        .collect();

    // estimate wrapped height to pin the newest message to the bottom
    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let visible_height = area.height.saturating_sub(2) as usize;
    let total_height: usize = lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(inner_width))
        .sum();
    let max_top = total_height.saturating_sub(visible_height);
    let top = max_top.saturating_sub(app.scroll_offset);

    let messages = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Conversation")
                .border_style(Style::default().fg(Color::Blue)),
        )
        .wrap(Wrap { trim: false })
        .scroll((top.min(u16::MAX as usize) as u16, 0));

    f.render_widget(messages, area);
}

fn format_message(msg: &Message, rich_text: bool) -> Vec<Line<'static>> {
    let (prefix, style) = match msg.sender {
        Sender::User => ("👤 You", Style::default().fg(Color::Cyan)),
        Sender::Bot => ("🛎  Concierge", Style::default().fg(Color::Green)),
    };

    let mut header = vec![Span::styled(prefix, style.add_modifier(Modifier::BOLD))];
    if msg.degraded {
        header.push(Span::styled(
            "  [offline]",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ));
    }

    let mut lines = vec![Line::from(header)];

    let body_style = Style::default().fg(Color::White);
    let body = if msg.is_bot() && rich_text {
        markdown::render(&msg.text, body_style)
    } else {
        markdown::plain(&msg.text, body_style)
    };
    lines.extend(body);

    lines.push(Line::from(Span::styled(
        format!("   └─ {} ", msg.created_at.format("%H:%M:%S")),
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));

    // Empty line for separation
    lines.push(Line::from(""));

    lines
}

fn draw_input(f: &mut Frame, app: &App, area: Rect) {
    let input_text = if !app.is_open() {
        Line::from(Span::styled(
            "Closed",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else if !app.engine.can_submit() {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Yellow)),
            Span::styled(
                "Please wait...",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            ),
        ])
    } else if app.input.is_empty() {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Green)),
            Span::styled(
                "Type your message...",
                Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Green)),
            Span::styled(app.input.as_str(), Style::default().fg(Color::White)),
            Span::styled("▌", Style::default().fg(Color::Green)),
        ])
    };

    let input = Paragraph::new(input_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Input")
                .border_style(Style::default().fg(Color::Blue)),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(input, area);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let help_text = if app.is_open() {
        "[Enter] Send  [Esc] Close  [PgUp/PgDn] Scroll  [Ctrl+C] Quit"
    } else {
        "[Ctrl+O] Open  [Ctrl+C] Quit"
    };

    let status = format!(
        " Messages: {} | {}",
        app.messages().len(),
        help_text
    );

    let status_bar = Paragraph::new(status)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::REVERSED));

    f.render_widget(status_bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn message(sender: Sender, text: &str, degraded: bool) -> Message {
        Message {
            id: format!("{}-1", sender),
            text: text.to_string(),
            sender,
            created_at: Local::now(),
            degraded,
        }
    }

    fn flatten(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_degraded_reply_is_marked() {
        let lines = format_message(&message(Sender::Bot, "Our spas offer...", true), true);
        assert!(flatten(&lines)[0].contains("[offline]"));

        let lines = format_message(&message(Sender::Bot, "Our spas offer...", false), true);
        assert!(!flatten(&lines)[0].contains("[offline]"));
    }

    #[test]
    fn test_user_text_is_never_interpreted() {
        let lines = format_message(&message(Sender::User, "**hello**", false), true);
        assert_eq!(flatten(&lines)[1], "**hello**");

        let lines = format_message(&message(Sender::Bot, "**hello**", false), true);
        assert_eq!(flatten(&lines)[1], "hello");

        let lines = format_message(&message(Sender::Bot, "**hello**", false), false);
        assert_eq!(flatten(&lines)[1], "**hello**");
    }
}
