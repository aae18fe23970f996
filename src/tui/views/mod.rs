pub mod compose;
pub mod detail;
pub mod help;
pub mod mailbox;

use super::input::Key;
use super::screen::{Color, Terminal};
use crate::api::types::Mailbox;
use crate::app::{App, Panel, ViewState};
use crate::notice::NoticeKind;
use std::io;

pub enum ViewAction {
    Continue,
    Quit,
    Help,
    /// Open the compose body in the external editor.
    EditBody,
}

/// Renders one panel and maps keys to controller operations. One instance per
/// panel is created at startup; all state lives in the `App`.
pub trait View {
    fn render(&self, state: &ViewState, term: &mut Terminal) -> io::Result<()>;
    /// `size` is the terminal's (rows, cols).
    fn handle_key(&self, app: &mut App, key: Key, size: (u16, u16)) -> ViewAction;
}

pub struct PanelViews {
    mailbox: mailbox::MailboxView,
    detail: detail::DetailView,
    compose: compose::ComposeView,
}

impl PanelViews {
    pub fn new() -> Self {
        PanelViews {
            mailbox: mailbox::MailboxView,
            detail: detail::DetailView,
            compose: compose::ComposeView,
        }
    }

    pub fn for_panel(&self, panel: Panel) -> &dyn View {
        match panel {
            Panel::Mailbox => &self.mailbox,
            Panel::Detail => &self.detail,
            Panel::Compose => &self.compose,
        }
    }

    pub fn render(&self, state: &ViewState, term: &mut Terminal) -> io::Result<()> {
        term.clear()?;
        self.for_panel(state.visible()).render(state, term)?;
        draw_notices(state, term)?;
        term.flush()
    }

    pub fn handle_key(&self, app: &mut App, key: Key, size: (u16, u16)) -> ViewAction {
        let panel = app.state().visible();
        self.for_panel(panel).handle_key(app, key, size)
    }
}

/// Navigation shared by the mailbox and detail panels.
fn handle_nav_key(app: &mut App, key: &Key) -> Option<ViewAction> {
    match key {
        Key::Char('i') => app.load_mailbox(Mailbox::Inbox),
        Key::Char('s') => app.load_mailbox(Mailbox::Sent),
        Key::Char('a') => app.load_mailbox(Mailbox::Archive),
        Key::Char('c') => app.compose_new(),
        Key::Char('?') => return Some(ViewAction::Help),
        _ => return None,
    }
    Some(ViewAction::Continue)
}

/// Bold title on row 1 with a rule underneath.
fn draw_header(term: &mut Terminal, title: &str) -> io::Result<()> {
    term.move_to(1, 1)?;
    term.set_bold()?;
    term.set_fg(Color::Blue)?;
    term.write_truncated(title, term.cols)?;
    term.reset_attr()?;
    term.move_to(2, 1)?;
    let sep = "-".repeat(term.cols as usize);
    term.write_str(&sep)
}

fn draw_status(term: &mut Terminal, status: &str) -> io::Result<()> {
    term.move_to(term.rows, 1)?;
    term.set_reverse()?;
    term.write_padded(status, term.cols)?;
    term.reset_attr()
}

/// Notices stack upward from just above the status bar, newest lowest.
fn draw_notices(state: &ViewState, term: &mut Terminal) -> io::Result<()> {
    for (i, notice) in state.notices.iter().enumerate() {
        let row = term.rows.saturating_sub(1 + i as u16);
        if row < 3 {
            break;
        }
        term.move_to(row, 1)?;
        term.set_bold()?;
        term.set_fg(match notice.kind {
            NoticeKind::Success => Color::Green,
            NoticeKind::Error => Color::Red,
        })?;
        term.write_padded(&format!(" {}", notice.text), term.cols)?;
        term.reset_attr()?;
    }
    Ok(())
}

/// Rows available between the header and the status bar.
fn body_rows(term_rows: u16) -> usize {
    (term_rows as usize).saturating_sub(3)
}

/// First visible item so that `cursor` stays on screen.
fn scroll_offset(cursor: usize, max_items: usize) -> usize {
    if max_items > 0 && cursor >= max_items {
        cursor - max_items + 1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_offset_keeps_cursor_visible() {
        assert_eq!(scroll_offset(0, 10), 0);
        assert_eq!(scroll_offset(9, 10), 0);
        assert_eq!(scroll_offset(10, 10), 1);
        assert_eq!(scroll_offset(5, 0), 0);
    }

    #[test]
    fn test_body_rows() {
        assert_eq!(body_rows(24), 21);
        assert_eq!(body_rows(2), 0);
    }
}
