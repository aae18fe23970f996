use super::{body_rows, draw_header, draw_status, View, ViewAction};
use crate::app::{App, ComposePanel, ViewState};
use crate::compose::ComposeField;
use crate::tui::input::Key;
use crate::tui::screen::Terminal;
use std::io;

const FIRST_ROW: u16 = 3;
const LABEL_WIDTH: usize = 10;

pub struct ComposeView;

fn label(field: ComposeField) -> &'static str {
    match field {
        ComposeField::Recipients => "To:",
        ComposeField::Subject => "Subject:",
        ComposeField::Body => "Body:",
    }
}

fn draw_label(term: &mut Terminal, field: ComposeField, focused: bool) -> io::Result<()> {
    if focused {
        term.set_reverse()?;
    } else {
        term.set_bold()?;
    }
    term.write_str(&format!("{:<w$}", label(field), w = LABEL_WIDTH))?;
    term.reset_attr()?;
    term.write_str(" ")
}

/// Keep the tail of a single-line field visible while typing.
fn tail(s: &str, width: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(width)).collect()
}

/// Field navigation and typing. Up/Down only move between fields outside the body.
fn edit_form(compose: &mut ComposePanel, key: Key) {
    let focus = compose.focus;
    let in_body = focus == ComposeField::Body;
    match key {
        Key::Tab => compose.focus = focus.next(),
        Key::BackTab => compose.focus = focus.prev(),
        Key::Down if !in_body => compose.focus = focus.next(),
        Key::Up if !in_body => compose.focus = focus.prev(),
        Key::Enter if in_body => compose.form.insert_char(focus, '\n'),
        Key::Enter => compose.focus = focus.next(),
        Key::Backspace => compose.form.backspace(focus),
        Key::Char(c) => compose.form.insert_char(focus, c),
        _ => {}
    }
}

impl View for ComposeView {
    fn render(&self, state: &ViewState, term: &mut Terminal) -> io::Result<()> {
        let compose = &state.compose;
        let title = if compose.reply_source.is_some() {
            "Reply"
        } else {
            "New Message"
        };
        draw_header(term, title)?;

        let value_width = (term.cols as usize).saturating_sub(LABEL_WIDTH + 2);
        let mut row = FIRST_ROW;
        for field in [ComposeField::Recipients, ComposeField::Subject] {
            term.move_to(row, 1)?;
            let focused = compose.focus == field;
            draw_label(term, field, focused)?;
            let mut value = tail(compose.form.field(field), value_width.saturating_sub(1));
            if focused {
                value.push('_');
            }
            term.write_truncated(&value, value_width as u16)?;
            row += 1;
        }

        term.move_to(row, 1)?;
        draw_label(term, ComposeField::Body, compose.focus == ComposeField::Body)?;
        row += 1;

        let mut body_lines: Vec<String> = compose
            .form
            .body
            .split('\n')
            .map(|l| l.replace('\t', "    "))
            .collect();
        if compose.focus == ComposeField::Body {
            if let Some(last) = body_lines.last_mut() {
                last.push('_');
            }
        }
        let available = body_rows(term.rows).saturating_sub(3);
        // Show the end of the body, where typing happens.
        let skip = body_lines.len().saturating_sub(available);
        for line in body_lines.iter().skip(skip) {
            term.move_to(row, 1)?;
            term.write_truncated(line, term.cols)?;
            row += 1;
        }

        let status = if compose.sending {
            " Sending...".to_string()
        } else if compose.reply_pending {
            " Loading original message...".to_string()
        } else {
            " Tab:next field C-s:send C-e:edit body in $EDITOR Esc:cancel".to_string()
        };
        draw_status(term, &status)
    }

    fn handle_key(&self, app: &mut App, key: Key, _size: (u16, u16)) -> ViewAction {
        match key {
            Key::Ctrl('c') => return ViewAction::Quit,
            Key::Ctrl('e') => return ViewAction::EditBody,
            Key::Ctrl('s') => app.submit_current(),
            Key::Escape => {
                let mailbox = app.state().mailbox.mailbox;
                app.load_mailbox(mailbox);
            }
            key => edit_form(&mut app.state_mut().compose, key),
        }
        ViewAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AfterSend, Panel};
    use crate::backend::BackendCommand;
    use std::sync::mpsc;
    use std::time::Duration;

    fn typed(app: &mut App, text: &str) {
        for c in text.chars() {
            ComposeView.handle_key(app, Key::Char(c), (24, 80));
        }
    }

    #[test]
    fn test_type_fields_and_send() {
        let (tx, rx) = mpsc::channel();
        let mut app = App::new(tx, "me@x.com".to_string(), AfterSend::Compose, Duration::from_secs(3));
        app.compose_new();
        typed(&mut app, "bob@x.com");
        ComposeView.handle_key(&mut app, Key::Enter, (24, 80));
        typed(&mut app, "Hi");
        ComposeView.handle_key(&mut app, Key::Tab, (24, 80));
        typed(&mut app, "line");
        ComposeView.handle_key(&mut app, Key::Enter, (24, 80));
        typed(&mut app, "two");
        ComposeView.handle_key(&mut app, Key::Ctrl('s'), (24, 80));

        match rx.try_iter().collect::<Vec<_>>().as_slice() {
            [BackendCommand::Send { outgoing }] => {
                assert_eq!(outgoing.recipients, "bob@x.com");
                assert_eq!(outgoing.subject, "Hi");
                assert_eq!(outgoing.body, "line\ntwo");
            }
            other => panic!("unexpected commands {:?}", other),
        }
        assert!(app.state().is_visible(Panel::Compose));
    }

    #[test]
    fn test_escape_leaves_compose() {
        let (tx, _rx) = mpsc::channel();
        let mut app = App::new(tx, "me@x.com".to_string(), AfterSend::Compose, Duration::from_secs(3));
        app.compose_new();
        ComposeView.handle_key(&mut app, Key::Escape, (24, 80));
        assert!(app.state().is_visible(Panel::Mailbox));
    }

    #[test]
    fn test_tail_keeps_end_visible() {
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("ab", 3), "ab");
    }
}
