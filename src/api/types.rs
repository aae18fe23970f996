use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type MessageId = u64;

/// Server-side mailbox filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mailbox {
    Inbox,
    Sent,
    Archive,
}

impl Mailbox {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mailbox::Inbox => "inbox",
            Mailbox::Sent => "sent",
            Mailbox::Archive => "archive",
        }
    }

    /// Heading shown above the list ("Inbox", "Sent", "Archive").
    pub fn title(&self) -> &'static str {
        match self {
            Mailbox::Inbox => "Inbox",
            Mailbox::Sent => "Sent",
            Mailbox::Archive => "Archive",
        }
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mailbox {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inbox" => Ok(Mailbox::Inbox),
            "sent" => Ok(Mailbox::Sent),
            "archive" | "archived" => Ok(Mailbox::Archive),
            other => Err(format!("unknown mailbox '{}'", other)),
        }
    }
}

/// A message as returned by `GET /emails/{mailbox}` and `GET /emails/{id}`.
///
/// Mailbox listings may omit recipients and body, so those default to empty.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub archived: bool,
}

impl Message {
    pub fn recipients_display(&self) -> String {
        self.recipients.join(", ")
    }
}

/// Partial update body for `PUT /emails/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessagePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

impl MessagePatch {
    pub fn read() -> Self {
        MessagePatch {
            read: Some(true),
            archived: None,
        }
    }

    pub fn archived(archived: bool) -> Self {
        MessagePatch {
            read: None,
            archived: Some(archived),
        }
    }
}

/// Body for `POST /emails`. Recipients are sent as the raw comma-separated
/// string the user typed; the server splits and validates them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutgoingMessage {
    pub recipients: String,
    pub subject: String,
    pub body: String,
}

/// Either field of the `POST /emails` (and error) payloads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
