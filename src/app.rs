//! View state and the controller that drives it.
//!
//! All mutable UI state lives in one [`ViewState`] owned by [`App`]. The
//! controller issues [`BackendCommand`]s and folds the matching
//! [`BackendResponse`]s back into the state; nothing else mutates it.

use crate::api::types::{Mailbox, Message, MessageId};
use crate::backend::{BackendCommand, BackendResponse};
use crate::compose::{ComposeField, ComposeForm};
use crate::notice::{NoticeKind, Notices};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The three mutually exclusive panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Mailbox,
    Detail,
    Compose,
}

impl Panel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Panel::Mailbox => "mailbox",
            Panel::Detail => "detail",
            Panel::Compose => "compose",
        }
    }
}

/// Where to go after the server accepts a sent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AfterSend {
    /// Re-open an empty compose form.
    #[default]
    Compose,
    /// Show the sent mailbox.
    Sent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MailboxRow {
    pub id: MessageId,
    pub sender: String,
    pub subject: String,
    pub timestamp: String,
    pub read: bool,
}

impl From<&Message> for MailboxRow {
    fn from(m: &Message) -> Self {
        MailboxRow {
            id: m.id,
            sender: m.sender.clone(),
            subject: m.subject.clone(),
            timestamp: m.timestamp.clone(),
            read: m.read,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStyle {
    Warning,
    Danger,
}

/// Archive/unarchive control state for the open message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveControl {
    /// Sent by the current user; archiving does not apply.
    Hidden,
    /// Message is not archived; the control offers "Archive".
    Archive,
    /// Message is archived; the control offers "Unarchive".
    Unarchive,
}

impl ArchiveControl {
    pub fn for_message(message: &Message, current_user: &str) -> Self {
        if message.sender == current_user {
            ArchiveControl::Hidden
        } else if message.archived {
            ArchiveControl::Unarchive
        } else {
            ArchiveControl::Archive
        }
    }

    pub fn label(&self) -> Option<&'static str> {
        match self {
            ArchiveControl::Hidden => None,
            ArchiveControl::Archive => Some("Archive"),
            ArchiveControl::Unarchive => Some("Unarchive"),
        }
    }

    pub fn style(&self) -> Option<ControlStyle> {
        match self {
            ArchiveControl::Hidden => None,
            ArchiveControl::Archive => Some(ControlStyle::Warning),
            ArchiveControl::Unarchive => Some(ControlStyle::Danger),
        }
    }

    /// The state after one click, and the `archived` value to write.
    pub fn toggled(&self) -> Option<(ArchiveControl, bool)> {
        match self {
            ArchiveControl::Hidden => None,
            ArchiveControl::Archive => Some((ArchiveControl::Unarchive, true)),
            ArchiveControl::Unarchive => Some((ArchiveControl::Archive, false)),
        }
    }
}

#[derive(Debug)]
pub struct MailboxPanel {
    pub mailbox: Mailbox,
    pub rows: Vec<MailboxRow>,
    pub cursor: usize,
    pub loading: bool,
    /// The current load is the inbox fallback after a failure.
    pub fallback: bool,
}

#[derive(Debug)]
pub struct DetailPanel {
    pub selected: Option<MessageId>,
    pub message: Option<Message>,
    pub archive: ArchiveControl,
    pub scroll: usize,
    pub loading: bool,
}

#[derive(Debug)]
pub struct ComposePanel {
    pub form: ComposeForm,
    pub focus: ComposeField,
    pub reply_source: Option<MessageId>,
    /// The reply source has been requested and not yet applied.
    pub reply_pending: bool,
    pub sending: bool,
}

/// The single view-state object.
#[derive(Debug)]
pub struct ViewState {
    visible: Panel,
    pub mailbox: MailboxPanel,
    pub detail: DetailPanel,
    pub compose: ComposePanel,
    pub notices: Notices,
}

impl ViewState {
    fn new(notice_ttl: Duration) -> Self {
        ViewState {
            visible: Panel::Mailbox,
            mailbox: MailboxPanel {
                mailbox: Mailbox::Inbox,
                rows: Vec::new(),
                cursor: 0,
                loading: false,
                fallback: false,
            },
            detail: DetailPanel {
                selected: None,
                message: None,
                archive: ArchiveControl::Hidden,
                scroll: 0,
                loading: false,
            },
            compose: ComposePanel {
                form: ComposeForm::default(),
                focus: ComposeField::Recipients,
                reply_source: None,
                reply_pending: false,
                sending: false,
            },
            notices: Notices::new(notice_ttl),
        }
    }

    pub fn visible(&self) -> Panel {
        self.visible
    }

    pub fn is_visible(&self, panel: Panel) -> bool {
        self.visible == panel
    }

    pub fn selected_row(&self) -> Option<&MailboxRow> {
        self.mailbox.rows.get(self.mailbox.cursor)
    }
}

pub struct App {
    cmd_tx: mpsc::Sender<BackendCommand>,
    current_user: String,
    after_send: AfterSend,
    state: ViewState,
    in_flight: usize,
}

impl App {
    pub fn new(
        cmd_tx: mpsc::Sender<BackendCommand>,
        current_user: String,
        after_send: AfterSend,
        notice_ttl: Duration,
    ) -> Self {
        App {
            cmd_tx,
            current_user,
            after_send,
            state: ViewState::new(notice_ttl),
            in_flight: 0,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ViewState {
        &mut self.state
    }

    pub fn current_user(&self) -> &str {
        &self.current_user
    }

    /// No request that produces a response is outstanding.
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    fn request(&mut self, cmd: BackendCommand) {
        debug!("Backend command: {:?}", cmd);
        if self.cmd_tx.send(cmd).is_ok() {
            self.in_flight += 1;
        } else {
            self.notify_error("Backend is not running");
        }
    }

    /// Log `text` and show it as an error notice.
    pub fn notify_error(&mut self, text: impl Into<String>) {
        let text = text.into();
        warn!("{}", text);
        self.state.notices.push(NoticeKind::Error, text);
    }

    /// Make `panel` the only visible panel and clear whatever it showed last.
    pub fn show_panel(&mut self, panel: Panel) {
        let state = &mut self.state;
        match panel {
            Panel::Mailbox => {
                state.mailbox.rows.clear();
                state.mailbox.cursor = 0;
                state.mailbox.loading = false;
                state.mailbox.fallback = false;
            }
            Panel::Detail => {
                state.detail.selected = None;
                state.detail.message = None;
                state.detail.archive = ArchiveControl::Hidden;
                state.detail.scroll = 0;
                state.detail.loading = false;
            }
            Panel::Compose => {
                state.compose.form = ComposeForm::default();
                state.compose.focus = ComposeField::Recipients;
                state.compose.reply_source = None;
                state.compose.reply_pending = false;
            }
        }
        state.visible = panel;
    }

    pub fn load_mailbox(&mut self, mailbox: Mailbox) {
        self.start_mailbox_load(mailbox, false);
    }

    fn fall_back_to_inbox(&mut self) {
        self.start_mailbox_load(Mailbox::Inbox, true);
    }

    fn start_mailbox_load(&mut self, mailbox: Mailbox, fallback: bool) {
        info!("Loading mailbox {}{}", mailbox, if fallback { " (fallback)" } else { "" });
        self.show_panel(Panel::Mailbox);
        self.state.mailbox.mailbox = mailbox;
        self.state.mailbox.loading = true;
        self.state.mailbox.fallback = fallback;
        self.request(BackendCommand::LoadMailbox { mailbox });
    }

    pub fn open_message(&mut self, id: MessageId) {
        info!("Opening message {}", id);
        self.show_panel(Panel::Detail);
        self.state.detail.selected = Some(id);
        self.state.detail.loading = true;
        self.request(BackendCommand::GetMessage { id });
    }

    /// Open the row under the mailbox cursor.
    pub fn open_selected(&mut self) {
        if let Some(id) = self.state.selected_row().map(|r| r.id) {
            self.open_message(id);
        }
    }

    pub fn compose_new(&mut self) {
        self.show_panel(Panel::Compose);
    }

    pub fn compose_reply(&mut self, id: MessageId) {
        info!("Replying to message {}", id);
        self.show_panel(Panel::Compose);
        self.state.compose.reply_source = Some(id);
        self.state.compose.reply_pending = true;
        self.request(BackendCommand::GetReplySource { id });
    }

    /// Reply to the message open in the detail panel.
    pub fn reply_to_open(&mut self) {
        if let Some(id) = self.state.detail.selected {
            self.compose_reply(id);
        }
    }

    /// Flip the archive control of the open message and write the new flag.
    /// The label changes before the server answers and is never rolled back.
    pub fn toggle_archive(&mut self) {
        if !self.state.is_visible(Panel::Detail) || self.state.detail.message.is_none() {
            return;
        }
        let Some(id) = self.state.detail.selected else {
            return;
        };
        let Some((next, archived)) = self.state.detail.archive.toggled() else {
            return;
        };
        self.state.detail.archive = next;
        if let Some(message) = self.state.detail.message.as_mut() {
            message.archived = archived;
        }
        self.request(BackendCommand::SetArchived { id, archived });
    }

    pub fn submit(&mut self, form: ComposeForm) {
        if self.state.compose.sending {
            debug!("Ignoring submit while a send is in flight");
            return;
        }
        let outgoing = form.to_outgoing();
        self.state.compose.form = form;
        self.state.compose.sending = true;
        self.request(BackendCommand::Send { outgoing });
    }

    /// Submit what is currently in the compose form.
    pub fn submit_current(&mut self) {
        let form = self.state.compose.form.clone();
        self.submit(form);
    }

    /// Expire old notices. Returns true if the screen needs a redraw.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.state.notices.is_empty() {
            return false;
        }
        self.state.notices.expire(now)
    }

    /// Fold a backend response into the view state. Returns true if the
    /// visible state changed.
    pub fn on_response(&mut self, response: BackendResponse) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        match response {
            BackendResponse::Mailbox { mailbox, result } => self.on_mailbox(mailbox, result),
            BackendResponse::Message { id, result } => self.on_message(id, *result),
            BackendResponse::ReplySource { id, result } => self.on_reply_source(id, *result),
            BackendResponse::ArchiveWritten {
                id,
                archived,
                result,
            } => match result {
                Ok(()) => {
                    debug!("Message {} archived={} stored", id, archived);
                    false
                }
                Err(e) => {
                    self.notify_error(format!(
                        "Could not {} message: {}",
                        if archived { "archive" } else { "unarchive" },
                        e
                    ));
                    true
                }
            },
            BackendResponse::Sent(result) => self.on_sent(result),
        }
    }

    fn on_mailbox(&mut self, mailbox: Mailbox, result: Result<Vec<Message>, String>) -> bool {
        let panel = &self.state.mailbox;
        if !self.state.is_visible(Panel::Mailbox) || panel.mailbox != mailbox || !panel.loading {
            debug!("Dropping stale response for mailbox {}", mailbox);
            return false;
        }
        match result {
            Ok(messages) => {
                let panel = &mut self.state.mailbox;
                panel.rows = messages.iter().map(MailboxRow::from).collect();
                panel.cursor = 0;
                panel.loading = false;
                panel.fallback = false;
            }
            Err(e) => {
                let was_fallback = self.state.mailbox.fallback;
                self.state.mailbox.loading = false;
                self.notify_error(e);
                if !was_fallback {
                    self.fall_back_to_inbox();
                }
            }
        }
        true
    }

    fn on_message(&mut self, id: MessageId, result: Result<Message, String>) -> bool {
        let detail = &self.state.detail;
        if !self.state.is_visible(Panel::Detail) || detail.selected != Some(id) || !detail.loading
        {
            debug!("Dropping stale response for message {}", id);
            return false;
        }
        match result {
            Ok(message) => {
                let unread = !message.read;
                let detail = &mut self.state.detail;
                detail.archive = ArchiveControl::for_message(&message, &self.current_user);
                detail.message = Some(message);
                detail.loading = false;
                if unread {
                    // No response is expected; failures only reach the log.
                    let _ = self.cmd_tx.send(BackendCommand::MarkRead { id });
                }
            }
            Err(e) => {
                self.state.detail.loading = false;
                self.notify_error(e);
                self.fall_back_to_inbox();
            }
        }
        true
    }

    fn on_reply_source(&mut self, id: MessageId, result: Result<Message, String>) -> bool {
        let compose = &self.state.compose;
        if !self.state.is_visible(Panel::Compose)
            || compose.reply_source != Some(id)
            || !compose.reply_pending
        {
            debug!("Dropping stale reply source {}", id);
            return false;
        }
        self.state.compose.reply_pending = false;
        match result {
            Ok(source) => {
                self.state.compose.form = ComposeForm::reply_to(&source);
                self.state.compose.focus = ComposeField::Body;
            }
            Err(e) => {
                self.notify_error(e);
                self.fall_back_to_inbox();
            }
        }
        true
    }

    fn on_sent(&mut self, result: Result<String, String>) -> bool {
        self.state.compose.sending = false;
        match result {
            Ok(message) => {
                info!("Message sent: {}", message);
                if self.state.is_visible(Panel::Compose) {
                    match self.after_send {
                        AfterSend::Compose => self.compose_new(),
                        AfterSend::Sent => self.load_mailbox(Mailbox::Sent),
                    }
                }
                self.state.notices.push(NoticeKind::Success, message);
            }
            Err(e) => self.notify_error(e),
        }
        true
    }
}
