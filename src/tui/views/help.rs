use crate::tui::input::Key;
use crate::tui::screen::Terminal;
use std::io;

const HELP_LINES: &[&str] = &[
    "mailpane",
    "========",
    "",
    "Anywhere outside compose",
    "------------------------",
    "  i           Inbox",
    "  s           Sent",
    "  a           Archive",
    "  c           Compose new message",
    "  ?           Show this help",
    "",
    "Mailbox",
    "-------",
    "  q           Quit",
    "  n/j/Down    Next message",
    "  p/k/Up      Previous message",
    "  Enter/click Open message",
    "  g           Reload",
    "  PgDn/PgUp   Page down/up",
    "  Home/End    Jump to top/bottom",
    "",
    "Message",
    "-------",
    "  q/Escape    Back to mailbox",
    "  j/k         Scroll",
    "  Space/PgDn  Page down",
    "  r           Reply",
    "  A           Archive/Unarchive (messages sent to you)",
    "",
    "Compose",
    "-------",
    "  Tab         Next field",
    "  Shift-Tab   Previous field",
    "  Enter       Next field (newline in body)",
    "  Ctrl-S      Send",
    "  Ctrl-E      Edit body in $EDITOR",
    "  Escape      Cancel",
    "",
];

/// Key reference shown over the current panel.
pub struct HelpView {
    scroll: usize,
}

impl HelpView {
    pub fn new() -> Self {
        HelpView { scroll: 0 }
    }

    pub fn render(&self, term: &mut Terminal) -> io::Result<()> {
        term.clear()?;

        let visible_rows = (term.rows as usize).saturating_sub(1);
        for (i, line) in HELP_LINES
            .iter()
            .skip(self.scroll)
            .enumerate()
            .take(visible_rows)
        {
            term.move_to(1 + i as u16, 1)?;
            let is_header = !line.is_empty()
                && !line.starts_with(' ')
                && !line.starts_with('-')
                && !line.starts_with('=');
            if is_header {
                term.set_bold()?;
                term.write_truncated(line, term.cols)?;
                term.reset_attr()?;
            } else {
                term.write_truncated(line, term.cols)?;
            }
        }

        term.move_to(term.rows, 1)?;
        term.set_reverse()?;
        let status = format!(
            " Help | line {}/{} | q:close j/k:scroll",
            self.scroll + 1,
            HELP_LINES.len()
        );
        term.write_padded(&status, term.cols)?;
        term.reset_attr()?;

        term.flush()
    }

    /// Returns false once the help should close.
    pub fn handle_key(&mut self, key: Key, term_rows: u16) -> bool {
        let last = HELP_LINES.len().saturating_sub(1);
        let page = (term_rows as usize).saturating_sub(1);
        match key {
            Key::Char('q') | Key::Char('?') | Key::Escape => return false,
            Key::Char('n') | Key::Char('j') | Key::Down | Key::ScrollDown => {
                self.scroll = (self.scroll + 1).min(last);
            }
            Key::Char('p') | Key::Char('k') | Key::Up | Key::ScrollUp => {
                self.scroll = self.scroll.saturating_sub(1);
            }
            Key::PageDown | Key::Char(' ') => self.scroll = (self.scroll + page).min(last),
            Key::PageUp => self.scroll = self.scroll.saturating_sub(page),
            Key::Home => self.scroll = 0,
            Key::End => self.scroll = last,
            _ => {}
        }
        true
    }
}
