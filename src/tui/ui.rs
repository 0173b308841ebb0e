use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::chat::{NoticeLevel, Sender};
use crate::config::Theme;
use crate::tui::{
    app::ChatApp,
    message::{attachment_summary, format_time, sender_label},
};

/// Colors for one theme
struct Palette {
    text: Color,
    muted: Color,
    user: Color,
    assistant: Color,
    success: Color,
    error: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                text: Color::White,
                muted: Color::DarkGray,
                user: Color::Cyan,
                assistant: Color::Green,
                success: Color::Green,
                error: Color::Red,
            },
            Theme::Light => Self {
                text: Color::Black,
                muted: Color::Gray,
                user: Color::Blue,
                assistant: Color::Magenta,
                success: Color::Green,
                error: Color::Red,
            },
        }
    }
}

/// Render the main UI
pub fn render_ui(f: &mut Frame, app: &ChatApp) {
    let palette = Palette::for_theme(app.settings().theme);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Status bar
            Constraint::Min(5),    // Messages
            Constraint::Length(3), // Input box
        ])
        .split(f.size());

    render_status_bar(f, app, &palette, chunks[0]);
    render_messages(f, app, &palette, chunks[1]);
    render_input_box(f, app, &palette, chunks[2]);
}

fn render_status_bar(f: &mut Frame, app: &ChatApp, palette: &Palette, area: Rect) {
    let thread = app.store().thread_id().unwrap_or("(new)").to_string();
    let state = if app.is_busy() { "Sending..." } else { "Ready" };

    let status_line = Line::from(vec![
        Span::styled("Webhook: ", Style::default().fg(palette.muted)),
        Span::styled(app.settings().webhook_url.clone(), Style::default().fg(palette.text)),
        Span::styled(" | Thread: ", Style::default().fg(palette.muted)),
        Span::styled(thread, Style::default().fg(palette.text)),
        Span::styled(" | Messages: ", Style::default().fg(palette.muted)),
        Span::styled(app.store().len().to_string(), Style::default().fg(palette.text)),
        Span::styled(" | ", Style::default().fg(palette.muted)),
        Span::styled(state, Style::default().fg(palette.assistant)),
    ]);

    let notice_line = match app.notice() {
        Some(notice) => {
            let color = match notice.level {
                NoticeLevel::Success => palette.success,
                NoticeLevel::Error => palette.error,
            };
            Line::from(Span::styled(notice.to_string(), Style::default().fg(color)))
        }
        None => Line::from(Span::styled(
            "Esc: normal mode | /attach <path> | /detach [name] | /clear",
            Style::default().fg(palette.muted),
        )),
    };

    let status_bar = Paragraph::new(Text::from(vec![status_line, notice_line]))
        .block(Block::default().borders(Borders::ALL).title("HookChat"));

    f.render_widget(status_bar, area);
}

fn render_messages(f: &mut Frame, app: &ChatApp, palette: &Palette, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Conversation");

    if app.store().is_empty() {
        let hint = Paragraph::new(Span::styled(
            "No messages yet. Type below and press Enter to send.",
            Style::default().fg(palette.muted),
        ))
        .block(block);
        f.render_widget(hint, area);
        return;
    }

    let messages: Vec<ListItem> = app
        .store()
        .messages()
        .iter()
        .map(|msg| {
            let color = match msg.sender {
                Sender::User => palette.user,
                Sender::Assistant => palette.assistant,
            };

            let header = Span::styled(
                format!("{} {}: ", sender_label(msg.sender), format_time(msg.timestamp)),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            );

            let mut lines = Vec::new();
            let mut content = msg.content.lines();
            let first = content.next().unwrap_or_default().to_string();
            lines.push(Line::from(vec![
                header,
                Span::styled(first, Style::default().fg(palette.text)),
            ]));
            for rest in content {
                lines.push(Line::from(Span::styled(
                    format!("  {}", rest),
                    Style::default().fg(palette.text),
                )));
            }

            if msg.has_attachments() {
                lines.push(Line::from(Span::styled(
                    format!("  Attached: {}", attachment_summary(&msg.attachments)),
                    Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
                )));
            }

            ListItem::new(Text::from(lines))
        })
        .collect();

    let messages_list = List::new(messages).block(block);

    f.render_widget(messages_list, area);
}

fn render_input_box(f: &mut Frame, app: &ChatApp, palette: &Palette, area: Rect) {
    let title = if app.attachments().is_empty() {
        "Input".to_string()
    } else {
        format!(
            "Input [{} attached: {}]",
            app.attachments().len(),
            attachment_summary(app.attachments())
        )
    };

    let input = Paragraph::new(app.input()).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(Style::default().fg(if app.is_busy() {
                palette.muted
            } else {
                palette.text
            })),
    );

    f.render_widget(input, area);

    if !app.is_busy() {
        let (x, y) = cursor_position(area, app.input().chars().count());
        f.set_cursor(x, y);
    }
}

/// Cursor just past the typed text, clamped inside the bordered box
fn cursor_position(area: Rect, input_len: usize) -> (u16, u16) {
    let inner_width = area.width.saturating_sub(2);
    let offset = u16::try_from(input_len).unwrap_or(u16::MAX).min(inner_width);
    (
        area.x.saturating_add(1).saturating_add(offset),
        area.y.saturating_add(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_follows_short_input() {
        let area = Rect::new(2, 10, 40, 3);
        assert_eq!(cursor_position(area, 0), (3, 11));
        assert_eq!(cursor_position(area, 5), (8, 11));
    }

    #[test]
    fn test_cursor_stays_inside_box_for_long_input() {
        let area = Rect::new(2, 10, 40, 3);
        assert_eq!(cursor_position(area, 500), (41, 11));
        assert_eq!(cursor_position(area, usize::MAX), (41, 11));
    }

    #[test]
    fn test_cursor_in_degenerate_area() {
        let area = Rect {
            x: u16::MAX - 1,
            y: u16::MAX,
            width: 1,
            height: 1,
        };
        assert_eq!(cursor_position(area, 10), (u16::MAX, u16::MAX));
    }
}
