use crate::api::client::ApiClient;
use crate::api::types::{Mailbox, Message, MessageId, MessagePatch, OutgoingMessage};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, warn};

/// Commands sent from the UI thread to the backend thread.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    LoadMailbox {
        mailbox: Mailbox,
    },
    GetMessage {
        id: MessageId,
    },
    GetReplySource {
        id: MessageId,
    },
    /// Fire-and-forget; produces no response.
    MarkRead {
        id: MessageId,
    },
    SetArchived {
        id: MessageId,
        archived: bool,
    },
    Send {
        outgoing: OutgoingMessage,
    },
    Shutdown,
}

/// Responses sent from the backend thread to the UI thread.
#[derive(Debug, Clone)]
pub enum BackendResponse {
    Mailbox {
        mailbox: Mailbox,
        result: Result<Vec<Message>, String>,
    },
    Message {
        id: MessageId,
        result: Box<Result<Message, String>>,
    },
    ReplySource {
        id: MessageId,
        result: Box<Result<Message, String>>,
    },
    ArchiveWritten {
        id: MessageId,
        archived: bool,
        result: Result<(), String>,
    },
    Sent(Result<String, String>),
}

/// Spawn the backend thread. Returns the command sender and response receiver.
pub fn spawn(
    client: ApiClient,
) -> (
    mpsc::Sender<BackendCommand>,
    mpsc::Receiver<BackendResponse>,
) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<BackendCommand>();
    let (resp_tx, resp_rx) = mpsc::channel::<BackendResponse>();

    thread::spawn(move || {
        backend_loop(client, cmd_rx, resp_tx);
    });

    (cmd_tx, resp_rx)
}

fn backend_loop(
    client: ApiClient,
    cmd_rx: mpsc::Receiver<BackendCommand>,
    resp_tx: mpsc::Sender<BackendResponse>,
) {
    while let Ok(cmd) = cmd_rx.recv() {
        let response = match cmd {
            BackendCommand::LoadMailbox { mailbox } => {
                let result = client.list_mailbox(mailbox).map_err(|e| e.to_string());
                Some(BackendResponse::Mailbox { mailbox, result })
            }
            BackendCommand::GetMessage { id } => {
                let result = client.get_message(id).map_err(|e| e.to_string());
                Some(BackendResponse::Message {
                    id,
                    result: Box::new(result),
                })
            }
            BackendCommand::GetReplySource { id } => {
                let result = client.get_message(id).map_err(|e| e.to_string());
                Some(BackendResponse::ReplySource {
                    id,
                    result: Box::new(result),
                })
            }
            BackendCommand::MarkRead { id } => {
                if let Err(e) = client.update_message(id, &MessagePatch::read()) {
                    warn!("Failed to mark message {} as read: {}", id, e);
                }
                None
            }
            BackendCommand::SetArchived { id, archived } => {
                let result = client
                    .update_message(id, &MessagePatch::archived(archived))
                    .map_err(|e| e.to_string());
                Some(BackendResponse::ArchiveWritten {
                    id,
                    archived,
                    result,
                })
            }
            BackendCommand::Send { outgoing } => {
                let result = client.send_message(&outgoing).map_err(|e| e.to_string());
                Some(BackendResponse::Sent(result))
            }
            BackendCommand::Shutdown => {
                debug!("Backend shutting down");
                break;
            }
        };

        if let Some(response) = response {
            if resp_tx.send(response).is_err() {
                break;
            }
        }
    }
}
