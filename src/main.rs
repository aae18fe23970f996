mod api;
mod app;
mod backend;
mod cli;
mod compose;
mod config;
mod log;
mod notice;
mod tui;

use api::client::ApiClient;
use app::App;
use config::{AccountConfig, Config};
use std::path::PathBuf;
use std::process::Command;
use tracing::{error, info};

fn default_config_path() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("mailpane").join("config.toml")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home)
            .join(".config")
            .join("mailpane")
            .join("config.toml")
    } else {
        PathBuf::from("config.toml")
    }
}

/// Run the account's `session_command` and return its first line of output.
pub fn run_session_command(cmd: &str) -> Result<String, String> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .output()
        .map_err(|e| format!("failed to execute session command: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "session command exited with {}: {}",
            output.status, stderr
        ));
    }

    let session = String::from_utf8(output.stdout)
        .map_err(|e| format!("session command output is not valid UTF-8: {}", e))?;
    let session = session.lines().next().unwrap_or("").trim().to_string();
    if session.is_empty() {
        return Err("session command printed nothing".to_string());
    }
    Ok(session)
}

fn connect_account(account: &AccountConfig) -> Result<ApiClient, String> {
    let session = match &account.session_command {
        Some(cmd) => Some(run_session_command(cmd)?),
        None => None,
    };
    Ok(ApiClient::new(&account.base_url, session))
}

fn show_log() {
    let path = log::log_path();
    if !path.exists() {
        eprintln!("No log file found at {}", path.display());
        std::process::exit(1);
    }
    let pager = std::env::var("PAGER").unwrap_or_else(|_| "less".to_string());
    match Command::new(&pager).arg(&path).status() {
        Ok(s) if s.success() => {}
        Ok(s) => std::process::exit(s.code().unwrap_or(1)),
        Err(e) => {
            eprintln!("Failed to launch pager '{}': {}", pager, e);
            std::process::exit(1);
        }
    }
}

fn print_help_config() {
    let config_path = default_config_path();
    println!("Default config file: {}", config_path.display());
    println!();
    println!("Available options:");
    println!();
    println!("[ui]");
    println!("  editor = \"nvim\"              # Body editor for Ctrl-E (fallback: $EDITOR, then vi)");
    println!("  mouse = true                 # Enable mouse support (default: true)");
    println!("  notice_secs = 3              # Seconds a notice stays on screen (default: 3)");
    println!();
    println!("[mail]");
    println!("  after_send = \"compose\"       # After a successful send: \"compose\" (fresh form) or \"sent\"");
    println!();
    println!("[account.NAME]                   # At least one account required");
    println!("  base_url = \"https://mail.example.com\"      # Server root; requests go to {{base_url}}/emails (required)");
    println!("  user = \"me@example.com\"                    # Your address (required)");
    println!("  session_command = \"pass show mail/cookie\"  # Shell command printing the session cookie (optional)");
}

fn arg_value<'a>(args: &'a [String], prefix: &str) -> Option<&'a str> {
    args.iter()
        .find(|a| a.starts_with(prefix))
        .map(|a| &a[prefix.len()..])
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: mailpane [OPTIONS]");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --config=PATH    Use config file at PATH instead of default");
        eprintln!("  --account=NAME   Use [account.NAME] instead of the first account");
        eprintln!("  --clear-log      Truncate the log file at startup");
        eprintln!("  --log            View the log file in $PAGER");
        eprintln!("  --cli            Run in JSON-over-stdin/stdout CLI mode");
        eprintln!("  --help-cli       Print CLI mode protocol documentation");
        eprintln!("  --help-config    Print default config path and all options");
        eprintln!("  --help           Show this help");
        std::process::exit(0);
    }

    if args.iter().any(|a| a == "--clear-log") {
        if let Err(e) = log::clear() {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }

    if args.iter().any(|a| a == "--log") {
        show_log();
        std::process::exit(0);
    }

    if args.iter().any(|a| a == "--help-cli") {
        cli::print_help_cli();
        std::process::exit(0);
    }

    if args.iter().any(|a| a == "--help-config") {
        print_help_config();
        std::process::exit(0);
    }

    log::init();

    let config_path = arg_value(&args, "--config=")
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config from {}: {}", config_path.display(), e);
            eprintln!("Create a config file with:");
            eprintln!();
            eprintln!("  [account.personal]");
            eprintln!("  base_url = \"https://mail.example.com\"");
            eprintln!("  user = \"you@example.com\"");
            std::process::exit(1);
        }
    };

    let account_name = arg_value(&args, "--account=");
    let account = match config.account(account_name) {
        Some(a) => a.clone(),
        None => {
            eprintln!(
                "No account named '{}' in {}",
                account_name.unwrap_or(""),
                config_path.display()
            );
            std::process::exit(1);
        }
    };

    let client = match connect_account(&account) {
        Ok(client) => client,
        Err(e) => {
            error!("Account {}: {}", account.name, e);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    info!("Using account {} at {}", account.name, client.base_url());

    let (cmd_tx, resp_rx) = backend::spawn(client);
    let app = App::new(
        cmd_tx.clone(),
        account.user.clone(),
        config.mail.after_send,
        config.ui.notice_ttl,
    );

    if args.iter().any(|a| a == "--cli") {
        cli::run_cli(app, resp_rx);
        let _ = cmd_tx.send(backend::BackendCommand::Shutdown);
        std::process::exit(0);
    }

    if let Err(e) = tui::run(app, resp_rx, cmd_tx, config.ui.editor, config.ui.mouse) {
        eprintln!("TUI error: {}", e);
        std::process::exit(1);
    }
}
