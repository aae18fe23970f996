use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "MAILPANE_LOG";

fn log_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        PathBuf::from(xdg).join("mailpane")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("mailpane")
    } else {
        PathBuf::from("/tmp").join("mailpane")
    }
}

pub fn log_path() -> PathBuf {
    log_dir().join("mailpane.log")
}

fn open_log_file() -> std::io::Result<File> {
    fs::create_dir_all(log_dir())?;
    OpenOptions::new().create(true).append(true).open(log_path())
}

/// Install the global subscriber. Output goes to the log file so it never
/// lands on the terminal the UI is drawing to; if the file cannot be opened
/// logging is disabled.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let file = match open_log_file() {
        Ok(file) => file,
        Err(e) => {
            eprintln!(
                "Warning: cannot open log file {}: {}",
                log_path().display(),
                e
            );
            return;
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

/// Truncate the log file.
pub fn clear() -> Result<(), String> {
    let path = log_path();
    if !path.exists() {
        return Ok(());
    }
    File::create(&path)
        .map(|_| ())
        .map_err(|e| format!("failed to clear log file {}: {}", path.display(), e))
}
