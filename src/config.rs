use crate::app::AfterSend;
use crate::notice::DEFAULT_NOTICE_TTL;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AccountConfig {
    pub name: String,
    pub base_url: String,
    pub user: String,
    pub session_command: Option<String>,
}

#[derive(Debug)]
pub struct Config {
    pub accounts: Vec<AccountConfig>,
    pub ui: UiConfig,
    pub mail: MailConfig,
}

#[derive(Debug)]
pub struct UiConfig {
    pub editor: Option<String>,
    pub mouse: bool,
    pub notice_ttl: Duration,
}

#[derive(Debug)]
pub struct MailConfig {
    pub after_send: AfterSend,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    ui: RawUiConfig,
    #[serde(default)]
    mail: RawMailConfig,
    #[serde(default)]
    account: BTreeMap<String, RawAccountFields>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawUiConfig {
    #[serde(default)]
    editor: Option<String>,
    #[serde(default = "default_mouse")]
    mouse: bool,
    #[serde(default = "default_notice_secs")]
    notice_secs: u64,
}

impl Default for RawUiConfig {
    fn default() -> Self {
        Self {
            editor: None,
            mouse: default_mouse(),
            notice_secs: default_notice_secs(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMailConfig {
    #[serde(default)]
    after_send: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAccountFields {
    base_url: Option<String>,
    user: Option<String>,
    session_command: Option<String>,
}

fn default_mouse() -> bool {
    true
}

fn default_notice_secs() -> u64 {
    DEFAULT_NOTICE_TTL.as_secs()
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;

        if raw.ui.notice_secs == 0 {
            return Err(ConfigError::Parse(
                "notice_secs must be greater than 0".to_string(),
            ));
        }

        let after_send = match raw.mail.after_send.as_deref() {
            None | Some("compose") => AfterSend::Compose,
            Some("sent") => AfterSend::Sent,
            Some(other) => {
                return Err(ConfigError::Parse(format!(
                    "invalid after_send '{}' (expected \"compose\" or \"sent\")",
                    other
                )))
            }
        };

        let mut accounts = Vec::new();
        for (name, account) in raw.account {
            let base_url = require_field(
                account.base_url,
                &format!("missing base_url in [account.{}]", name),
            )?;
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(ConfigError::Parse(format!(
                    "base_url in [account.{}] must start with http:// or https://",
                    name
                )));
            }
            let user = require_field(
                account.user,
                &format!("missing user in [account.{}]", name),
            )?;
            accounts.push(AccountConfig {
                name,
                base_url,
                user,
                session_command: account.session_command,
            });
        }

        if accounts.is_empty() {
            return Err(ConfigError::Parse(
                "at least one [account.NAME] section is required".to_string(),
            ));
        }

        Ok(Config {
            accounts,
            ui: UiConfig {
                editor: raw.ui.editor,
                mouse: raw.ui.mouse,
                notice_ttl: Duration::from_secs(raw.ui.notice_secs),
            },
            mail: MailConfig { after_send },
        })
    }

    /// Look up an account by name, or the first one when no name is given.
    pub fn account(&self, name: Option<&str>) -> Option<&AccountConfig> {
        match name {
            Some(name) => self.accounts.iter().find(|a| a.name == name),
            None => self.accounts.first(),
        }
    }
}

fn require_field(value: Option<String>, err: &str) -> Result<String, ConfigError> {
    value.ok_or_else(|| ConfigError::Parse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_config(extra: &str) -> String {
        format!(
            r#"
{extra}
[account.personal]
base_url = "https://mail.example.com"
user = "me@example.com"
"#
        )
    }

    #[test]
    fn test_parse_minimal_config_defaults() {
        let config = Config::parse(&account_config("")).unwrap();
        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.accounts[0].name, "personal");
        assert_eq!(config.accounts[0].user, "me@example.com");
        assert!(config.accounts[0].session_command.is_none());
        assert!(config.ui.mouse);
        assert_eq!(config.ui.notice_ttl, Duration::from_secs(3));
        assert_eq!(config.mail.after_send, AfterSend::Compose);
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
[ui]
editor = "nvim"
mouse = false
notice_secs = 5

[mail]
after_send = "sent"

[account.work]
base_url = "http://127.0.0.1:8000"
user = "me@work.com"
session_command = "cat ~/.mail-cookie"

[account.home]
base_url = "https://mail.example.com"
user = "me@example.com"
"#,
        )
        .unwrap();

        assert_eq!(config.accounts.len(), 2);
        assert_eq!(config.accounts[0].name, "home");
        assert_eq!(config.account(Some("work")).unwrap().user, "me@work.com");
        assert_eq!(config.account(None).unwrap().name, "home");
        assert!(config.account(Some("nope")).is_none());
        assert_eq!(config.ui.editor.as_deref(), Some("nvim"));
        assert!(!config.ui.mouse);
        assert_eq!(config.ui.notice_ttl, Duration::from_secs(5));
        assert_eq!(config.mail.after_send, AfterSend::Sent);
    }

    #[test]
    fn test_unknown_key_errors() {
        let err = Config::parse(&account_config("[ui]\npage_size = 10")).unwrap_err();
        match err {
            ConfigError::Parse(msg) => assert!(msg.contains("unknown field"), "got: {}", msg),
            _ => panic!("expected parse error"),
        }
    }

    #[test]
    fn test_missing_user() {
        let err = Config::parse(
            r#"
[account.broken]
base_url = "https://mail.example.com"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing user in [account.broken]"));
    }

    #[test]
    fn test_no_accounts() {
        let err = Config::parse("[ui]\nmouse = true\n").unwrap_err();
        assert!(err.to_string().contains("at least one [account.NAME]"));
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::parse(&account_config("[mail]\nafter_send = \"inbox\"")).unwrap_err();
        assert!(err.to_string().contains("invalid after_send"));

        let err = Config::parse(&account_config("[ui]\nnotice_secs = 0")).unwrap_err();
        assert!(err.to_string().contains("notice_secs"));

        let err = Config::parse(
            "[account.x]\nbase_url = \"mail.example.com\"\nuser = \"a@b.c\"\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("http://"));
    }
}
