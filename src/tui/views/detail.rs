use super::{body_rows, draw_header, draw_status, handle_nav_key, View, ViewAction};
use crate::api::types::Message;
use crate::app::{App, ControlStyle, ViewState};
use crate::tui::input::Key;
use crate::tui::screen::{Color, Terminal};
use std::io;

const FIRST_ROW: u16 = 3;

pub struct DetailView;

/// Header block followed by the body with its line breaks and blank lines kept.
/// Long lines wrap at `width`.
fn message_lines(message: &Message, width: usize) -> Vec<String> {
    let mut lines = vec![
        format!("From: {}", message.sender),
        format!("To: {}", message.recipients_display()),
        format!("Date: {}", message.timestamp),
        String::new(),
    ];
    for line in message.body.replace("\r\n", "\n").split('\n') {
        lines.extend(wrap(&line.replace('\t', "    "), width));
    }
    lines
}

fn wrap(line: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![String::new()];
    }
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn max_scroll(state: &ViewState, cols: u16, rows: u16) -> usize {
    state
        .detail
        .message
        .as_ref()
        .map(|m| message_lines(m, cols as usize).len())
        .unwrap_or(0)
        .saturating_sub(body_rows(rows).saturating_sub(1))
}

impl View for DetailView {
    fn render(&self, state: &ViewState, term: &mut Terminal) -> io::Result<()> {
        let detail = &state.detail;

        let message = match detail.message.as_ref() {
            Some(m) => m,
            None => {
                draw_header(term, "")?;
                term.move_to(FIRST_ROW, 1)?;
                let text = if detail.loading {
                    "Loading message..."
                } else {
                    "No message open."
                };
                term.write_truncated(text, term.cols)?;
                return draw_status(term, " i/s/a:mailbox c:compose ?:help q:back");
            }
        };

        let subject = if message.subject.is_empty() {
            "(no subject)"
        } else {
            message.subject.as_str()
        };
        draw_header(term, subject)?;

        // Controls row
        term.move_to(FIRST_ROW, 1)?;
        term.write_str(" [r] Reply")?;
        if let (Some(label), Some(style)) = (detail.archive.label(), detail.archive.style()) {
            term.write_str("   ")?;
            term.set_bold()?;
            term.set_fg(match style {
                ControlStyle::Warning => Color::Yellow,
                ControlStyle::Danger => Color::Red,
            })?;
            term.write_str(&format!("[A] {}", label))?;
            term.reset_attr()?;
        }

        let lines = message_lines(message, term.cols as usize);
        let visible = body_rows(term.rows).saturating_sub(1);
        for (i, line) in lines.iter().skip(detail.scroll).take(visible).enumerate() {
            term.move_to(FIRST_ROW + 1 + i as u16, 1)?;
            let is_header = detail.scroll + i < 3;
            if is_header {
                term.set_bold()?;
            }
            term.write_truncated(line, term.cols)?;
            if is_header {
                term.reset_attr()?;
            }
        }

        let status = format!(
            " line {}/{} | r:reply{} j/k:scroll i/s/a:mailbox c:compose q:back",
            (detail.scroll + 1).min(lines.len()),
            lines.len(),
            if detail.archive.label().is_some() {
                " A:archive"
            } else {
                ""
            }
        );
        draw_status(term, &status)
    }

    fn handle_key(&self, app: &mut App, key: Key, size: (u16, u16)) -> ViewAction {
        if let Some(action) = handle_nav_key(app, &key) {
            return action;
        }

        match key {
            Key::Char('q') | Key::Escape => {
                let mailbox = app.state().mailbox.mailbox;
                app.load_mailbox(mailbox);
            }
            Key::Char('r') => app.reply_to_open(),
            Key::Char('A') => app.toggle_archive(),
            Key::Char('j') | Key::Down | Key::ScrollDown => scroll_by(app, 1, size),
            Key::Char('k') | Key::Up | Key::ScrollUp => scroll_by(app, -1, size),
            Key::PageDown | Key::Char(' ') => scroll_by(app, 20, size),
            Key::PageUp => scroll_by(app, -20, size),
            Key::Home => app.state_mut().detail.scroll = 0,
            _ => {}
        }
        ViewAction::Continue
    }
}

fn scroll_by(app: &mut App, delta: isize, (rows, cols): (u16, u16)) {
    let limit = max_scroll(app.state(), cols, rows);
    let detail = &mut app.state_mut().detail;
    let next = (detail.scroll as isize + delta).max(0) as usize;
    detail.scroll = next.min(limit);
}
