use crate::api::types::{Mailbox, MessageId};
use crate::app::{App, ControlStyle};
use crate::backend::BackendResponse;
use crate::compose::ComposeForm;
use crate::notice::NoticeKind;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(60);

struct CliState {
    app: App,
    resp_rx: mpsc::Receiver<BackendResponse>,
}

impl CliState {
    /// Feed backend responses into the app until nothing is outstanding.
    fn run_to_idle(&mut self) -> Result<(), String> {
        while !self.app.is_idle() {
            let response = self
                .resp_rx
                .recv_timeout(RESPONSE_TIMEOUT)
                .map_err(|e| format!("backend did not respond: {}", e))?;
            self.app.on_response(response);
        }
        self.app.tick(Instant::now());
        Ok(())
    }
}

fn err_response(msg: &str) -> Value {
    json!({"ok": false, "error": msg})
}

fn style_name(style: ControlStyle) -> &'static str {
    match style {
        ControlStyle::Warning => "warning",
        ControlStyle::Danger => "danger",
    }
}

/// The visible state as JSON.
fn snapshot(app: &App) -> Value {
    let state = app.state();

    let rows: Vec<Value> = state
        .mailbox
        .rows
        .iter()
        .map(|r| {
            json!({
                "id": r.id,
                "sender": r.sender,
                "subject": r.subject,
                "timestamp": r.timestamp,
                "read": r.read,
            })
        })
        .collect();

    let message = state.detail.message.as_ref().map(|m| {
        json!({
            "id": m.id,
            "sender": m.sender,
            "recipients": m.recipients_display(),
            "subject": m.subject,
            "timestamp": m.timestamp,
            "body": m.body,
            "read": m.read,
            "archived": m.archived,
        })
    });

    let archive = match (state.detail.archive.label(), state.detail.archive.style()) {
        (Some(label), Some(style)) => json!({"label": label, "style": style_name(style)}),
        _ => Value::Null,
    };

    let notices: Vec<Value> = state
        .notices
        .iter()
        .map(|n| {
            json!({
                "kind": match n.kind {
                    NoticeKind::Success => "success",
                    NoticeKind::Error => "error",
                },
                "text": n.text,
            })
        })
        .collect();

    json!({
        "ok": true,
        "panel": state.visible().as_str(),
        "user": app.current_user(),
        "mailbox": {
            "name": state.mailbox.mailbox.as_str(),
            "title": state.mailbox.mailbox.title(),
            "loading": state.mailbox.loading,
            "rows": rows,
        },
        "detail": {
            "id": state.detail.selected,
            "message": message,
            "archive": archive,
        },
        "compose": {
            "recipients": state.compose.form.recipients,
            "subject": state.compose.form.subject,
            "body": state.compose.form.body,
            "sending": state.compose.sending,
        },
        "notices": notices,
    })
}

fn require_id(input: &Value) -> Result<MessageId, String> {
    input
        .get("id")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| "missing or invalid 'id' field".to_string())
}

fn string_field(input: &Value, name: &str, current: &str) -> String {
    input
        .get(name)
        .and_then(|v| v.as_str())
        .unwrap_or(current)
        .to_string()
}

fn dispatch(state: &mut CliState, input: &Value) -> Value {
    let command = match input.get("command").and_then(|v| v.as_str()) {
        Some(c) => c,
        None => return err_response("missing 'command' field"),
    };

    let result = match command {
        "status" => Ok(()),
        "load_mailbox" => cmd_load_mailbox(state, input),
        "open_message" => cmd_open_message(state, input),
        "compose" => {
            state.app.compose_new();
            Ok(())
        }
        "reply" => cmd_reply(state, input),
        "send" => cmd_send(state, input),
        "toggle_archive" => {
            state.app.toggle_archive();
            Ok(())
        }
        _ => Err(format!("unknown command '{}'", command)),
    };

    match result.and_then(|_| state.run_to_idle()) {
        Ok(()) => snapshot(&state.app),
        Err(e) => err_response(&e),
    }
}

// --- Command handlers ---

fn cmd_load_mailbox(state: &mut CliState, input: &Value) -> Result<(), String> {
    let mailbox: Mailbox = input
        .get("mailbox")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "missing 'mailbox' field".to_string())?
        .parse()?;
    state.app.load_mailbox(mailbox);
    Ok(())
}

fn cmd_open_message(state: &mut CliState, input: &Value) -> Result<(), String> {
    let id = require_id(input)?;
    state.app.open_message(id);
    Ok(())
}

fn cmd_reply(state: &mut CliState, input: &Value) -> Result<(), String> {
    match input.get("id") {
        Some(_) => {
            let id = require_id(input)?;
            state.app.compose_reply(id);
        }
        None => {
            if state.app.state().detail.selected.is_none() {
                return Err("no message is open".to_string());
            }
            state.app.reply_to_open();
        }
    }
    Ok(())
}

/// Fields missing from the command keep whatever the compose form holds.
fn cmd_send(state: &mut CliState, input: &Value) -> Result<(), String> {
    let current = &state.app.state().compose.form;
    let form = ComposeForm {
        recipients: string_field(input, "recipients", &current.recipients),
        subject: string_field(input, "subject", &current.subject),
        body: string_field(input, "body", &current.body),
    };
    state.app.submit(form);
    Ok(())
}

/// Read one JSON command per line from stdin, write one JSON response per line.
pub fn run_cli(app: App, resp_rx: mpsc::Receiver<BackendResponse>) {
    let mut state = CliState { app, resp_rx };
    info!("CLI mode started");

    state.app.load_mailbox(Mailbox::Inbox);
    if let Err(e) = state.run_to_idle() {
        warn!("Initial inbox load failed: {}", e);
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(&line) {
            Ok(input) => dispatch(&mut state, &input),
            Err(e) => err_response(&format!("invalid JSON: {}", e)),
        };

        let mut out = stdout.lock();
        if writeln!(out, "{}", response).is_err() || out.flush().is_err() {
            break;
        }
    }
    info!("CLI mode finished");
}

pub fn print_help_cli() {
    println!(
        r#"mailpane CLI mode (--cli)

Send one JSON object per line on stdin; one JSON object per line is written to
stdout. The inbox is loaded before the first command is read.

Commands:
  {{"command": "status"}}
  {{"command": "load_mailbox", "mailbox": "inbox" | "sent" | "archive"}}
  {{"command": "open_message", "id": 12}}
  {{"command": "compose"}}
  {{"command": "reply", "id": 12}}        (id optional: replies to the open message)
  {{"command": "send", "recipients": "a@x.com, b@y.com", "subject": "...", "body": "..."}}
  {{"command": "toggle_archive"}}       (acts on the open message)

Every command waits for its requests to finish and answers with the view state:
  {{"ok": true, "panel": "mailbox" | "detail" | "compose", "user": "...",
    "mailbox": {{"name", "title", "loading", "rows": [{{"id", "sender", "subject", "timestamp", "read"}}]}},
    "detail": {{"id", "message": {{...}} | null, "archive": {{"label", "style"}} | null}},
    "compose": {{"recipients", "subject", "body", "sending"}},
    "notices": [{{"kind": "success" | "error", "text"}}]}}

Errors: {{"ok": false, "error": "..."}}"#
    );
}
