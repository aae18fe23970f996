use crate::api::types::{Message, OutgoingMessage};
use std::fs;
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeField {
    Recipients,
    Subject,
    Body,
}

impl ComposeField {
    pub fn next(self) -> Self {
        match self {
            ComposeField::Recipients => ComposeField::Subject,
            ComposeField::Subject => ComposeField::Body,
            ComposeField::Body => ComposeField::Recipients,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ComposeField::Recipients => ComposeField::Body,
            ComposeField::Subject => ComposeField::Recipients,
            ComposeField::Body => ComposeField::Subject,
        }
    }
}

/// The three compose form fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposeForm {
    pub recipients: String,
    pub subject: String,
    pub body: String,
}

impl ComposeForm {
    /// Pre-fill a reply to `source`.
    pub fn reply_to(source: &Message) -> Self {
        ComposeForm {
            recipients: source.sender.clone(),
            subject: reply_subject(&source.subject),
            body: quoted_body(source),
        }
    }

    pub fn field(&self, field: ComposeField) -> &str {
        match field {
            ComposeField::Recipients => &self.recipients,
            ComposeField::Subject => &self.subject,
            ComposeField::Body => &self.body,
        }
    }

    pub fn field_mut(&mut self, field: ComposeField) -> &mut String {
        match field {
            ComposeField::Recipients => &mut self.recipients,
            ComposeField::Subject => &mut self.subject,
            ComposeField::Body => &mut self.body,
        }
    }

    /// Append a typed character. Newlines are only accepted in the body.
    pub fn insert_char(&mut self, field: ComposeField, c: char) {
        if c == '\n' && field != ComposeField::Body {
            return;
        }
        self.field_mut(field).push(c);
    }

    pub fn backspace(&mut self, field: ComposeField) {
        self.field_mut(field).pop();
    }

    pub fn to_outgoing(&self) -> OutgoingMessage {
        OutgoingMessage {
            recipients: self.recipients.trim().to_string(),
            subject: self.subject.clone(),
            body: self.body.clone(),
        }
    }
}

/// Prefix `Re: ` unless the subject already starts with it, ignoring case.
pub fn reply_subject(subject: &str) -> String {
    if subject.to_lowercase().starts_with("re:") {
        subject.to_string()
    } else {
        format!("Re: {}", subject)
    }
}

/// Reply body: two blank lines for the reply text, then the attribution line
/// and the original body.
pub fn quoted_body(source: &Message) -> String {
    format!(
        "\n\nOn {} {} wrote:\n\n{}",
        source.timestamp, source.sender, source.body
    )
}

/// Write content to a temp file with restrictive permissions (0600).
pub fn write_temp_file(content: &str) -> io::Result<PathBuf> {
    let dir = std::env::temp_dir();
    let filename = format!("mailpane-body-{}.txt", std::process::id());
    let path = dir.join(filename);

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(&path)?;

    io::Write::write_all(&mut file, content.as_bytes())?;
    Ok(path)
}

/// Read an edited body back and remove the temp file.
pub fn take_temp_file(path: &Path) -> io::Result<String> {
    let content = fs::read_to_string(path)?;
    let _ = fs::remove_file(path);
    Ok(content)
}
