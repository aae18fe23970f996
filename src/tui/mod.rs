pub mod input;
pub mod screen;
pub mod views;

use crate::api::types::Mailbox;
use crate::app::App;
use crate::backend::{BackendCommand, BackendResponse};
use crate::compose::{self, ComposeField};
use input::read_key;
use screen::Terminal;
use std::io;
use std::process::Command;
use std::sync::mpsc;
use std::time::Instant;
use tracing::info;
use views::help::HelpView;
use views::{PanelViews, ViewAction};

pub fn run(
    mut app: App,
    resp_rx: mpsc::Receiver<BackendResponse>,
    cmd_tx: mpsc::Sender<BackendCommand>,
    editor: Option<String>,
    mouse: bool,
) -> io::Result<()> {
    let mut term = Terminal::new(mouse)?;
    let views = PanelViews::new();
    let mut help: Option<HelpView> = None;

    let editor_cmd = editor
        .or_else(|| std::env::var("EDITOR").ok())
        .unwrap_or_else(|| "vi".to_string());

    app.load_mailbox(Mailbox::Inbox);
    views.render(app.state(), &mut term)?;

    loop {
        let mut needs_render = term.check_resize();

        while let Ok(response) = resp_rx.try_recv() {
            if app.on_response(response) {
                needs_render = true;
            }
        }
        if app.tick(Instant::now()) {
            needs_render = true;
        }

        if let Some(key) = read_key() {
            if let Some(h) = help.as_mut() {
                if !h.handle_key(key, term.rows) {
                    help = None;
                }
            } else {
                match views.handle_key(&mut app, key, (term.rows, term.cols)) {
                    ViewAction::Continue => {}
                    ViewAction::Quit => break,
                    ViewAction::Help => help = Some(HelpView::new()),
                    ViewAction::EditBody => edit_body(&mut app, &mut term, &editor_cmd)?,
                }
            }
            needs_render = true;
        }

        if needs_render {
            match help.as_ref() {
                Some(h) => h.render(&mut term)?,
                None => views.render(app.state(), &mut term)?,
            }
        }
    }

    info!("Leaving TUI");
    let _ = cmd_tx.send(BackendCommand::Shutdown);
    Ok(())
}

/// Run the editor on the compose body and take back whatever it saved.
fn edit_body(app: &mut App, term: &mut Terminal, editor_cmd: &str) -> io::Result<()> {
    let body = app.state().compose.form.body.clone();
    let path = match compose::write_temp_file(&body) {
        Ok(path) => path,
        Err(e) => {
            finish_edit(app, Err(format!("Could not create temp file: {}", e)));
            return Ok(());
        }
    };

    term.suspend()?;
    let status = Command::new("sh")
        .arg("-c")
        .arg(format!("{} {}", editor_cmd, path.display()))
        .status();
    term.resume()?;

    let result = match status {
        Ok(s) if s.success() => compose::take_temp_file(&path)
            .map_err(|e| format!("Could not read edited body: {}", e)),
        Ok(s) => {
            let _ = std::fs::remove_file(&path);
            Err(format!("Editor exited with {}", s))
        }
        Err(e) => {
            let _ = std::fs::remove_file(&path);
            Err(format!("Could not run editor '{}': {}", editor_cmd, e))
        }
    };
    finish_edit(app, result);
    Ok(())
}

/// The form keeps its old body when the edit failed.
fn finish_edit(app: &mut App, result: Result<String, String>) {
    match result {
        Ok(edited) => {
            let compose = &mut app.state_mut().compose;
            compose.form.body = edited;
            compose.focus = ComposeField::Body;
        }
        Err(e) => app.notify_error(e),
    }
}
