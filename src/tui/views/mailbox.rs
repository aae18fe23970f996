use super::{body_rows, draw_header, draw_status, handle_nav_key, scroll_offset, View, ViewAction};
use crate::app::{App, MailboxRow, ViewState};
use crate::tui::input::Key;
use crate::tui::screen::{clip, Terminal};
use std::io;

/// First terminal row used for list entries.
const FIRST_ROW: u16 = 3;

pub struct MailboxView;

fn format_row(row: &MailboxRow, width: u16) -> String {
    let marker = if row.read { ' ' } else { '*' };
    let w = width as usize;
    let date_width = row.timestamp.chars().count().min(22);
    let from_width = 24.min(w.saturating_sub(date_width + 6));
    let subj_width = w.saturating_sub(from_width + date_width + 6);

    let subject = if row.subject.is_empty() {
        "(no subject)"
    } else {
        row.subject.as_str()
    };

    format!(
        " {} {:from_w$} {:subj_w$} {}",
        marker,
        truncate(&row.sender, from_width),
        truncate(subject, subj_width),
        clip(&row.timestamp, date_width),
        from_w = from_width,
        subj_w = subj_width
    )
}

fn truncate(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        clip(s, max)
    } else if max <= 3 {
        clip(s, max)
    } else {
        format!("{}...", clip(s, max - 3))
    }
}

impl View for MailboxView {
    fn render(&self, state: &ViewState, term: &mut Terminal) -> io::Result<()> {
        let panel = &state.mailbox;
        draw_header(term, panel.mailbox.title())?;

        if panel.loading && panel.rows.is_empty() {
            term.move_to(FIRST_ROW, 1)?;
            term.write_truncated("Loading...", term.cols)?;
        } else if panel.rows.is_empty() {
            term.move_to(FIRST_ROW, 1)?;
            term.write_truncated("No messages.", term.cols)?;
        } else {
            let max_items = body_rows(term.rows);
            let offset = scroll_offset(panel.cursor, max_items);

            for (i, row) in panel.rows.iter().skip(offset).enumerate().take(max_items) {
                term.move_to(FIRST_ROW + i as u16, 1)?;
                if offset + i == panel.cursor {
                    term.set_reverse()?;
                }
                if row.read {
                    term.set_dim()?;
                } else {
                    term.set_bold()?;
                }
                term.write_padded(&format_row(row, term.cols), term.cols)?;
                term.reset_attr()?;
            }
        }

        let status = if panel.rows.is_empty() {
            " i:inbox s:sent a:archive c:compose g:reload ?:help q:quit".to_string()
        } else {
            format!(
                " {}/{} | RET:open i/s/a:mailbox c:compose g:reload ?:help q:quit",
                panel.cursor + 1,
                panel.rows.len()
            )
        };
        draw_status(term, &status)
    }

    fn handle_key(&self, app: &mut App, key: Key, (term_rows, _): (u16, u16)) -> ViewAction {
        if let Some(action) = handle_nav_key(app, &key) {
            return action;
        }

        let panel = &mut app.state_mut().mailbox;
        let len = panel.rows.len();
        match key {
            Key::Char('q') | Key::Ctrl('c') => return ViewAction::Quit,
            Key::Char('j') | Key::Char('n') | Key::Down | Key::ScrollDown => {
                if panel.cursor + 1 < len {
                    panel.cursor += 1;
                }
            }
            Key::Char('k') | Key::Char('p') | Key::Up | Key::ScrollUp => {
                panel.cursor = panel.cursor.saturating_sub(1);
            }
            Key::PageDown => {
                if len > 0 {
                    panel.cursor = (panel.cursor + 20).min(len - 1);
                }
            }
            Key::PageUp => panel.cursor = panel.cursor.saturating_sub(20),
            Key::Home => panel.cursor = 0,
            Key::End => panel.cursor = len.saturating_sub(1),
            Key::Enter => app.open_selected(),
            Key::MouseClick { row, .. } => {
                if row >= FIRST_ROW {
                    let offset = scroll_offset(panel.cursor, body_rows(term_rows));
                    let idx = offset + (row - FIRST_ROW) as usize;
                    if idx < len {
                        panel.cursor = idx;
                        app.open_selected();
                    }
                }
            }
            Key::Char('g') => {
                let mailbox = panel.mailbox;
                app.load_mailbox(mailbox);
            }
            _ => {}
        }
        ViewAction::Continue
    }
}
