use uuid::Uuid;

use super::envelope::{encode_attachments, Envelope, EnvelopeShape, WebhookReply};
use super::error::ChatError;
use super::message::{now_millis, AttachmentFile, Message};
use super::notice::Notice;
use super::store::ConversationStore;
use super::transport::WebhookTransport;

const SEND_FAILED: &str = "Failed to send message";
const CLEARED: &str = "Conversation cleared";

/// A send whose user message is already in the log but whose request has
/// not been made yet
#[derive(Debug)]
pub struct PendingSend {
    content: String,
    timestamp: i64,
    attachments: Vec<AttachmentFile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing to send
    Ignored,
    /// The webhook answered and the reply was logged
    Replied,
    /// A notice describes what went wrong
    Failed,
}

/// Turns composed messages into webhook requests and their replies (or
/// failures) back into conversation state.
pub struct MessageDispatcher {
    store: ConversationStore,
    transport: Box<dyn WebhookTransport>,
    shape: EnvelopeShape,
    notices: Vec<Notice>,
}

impl MessageDispatcher {
    pub fn new(transport: Box<dyn WebhookTransport>, shape: EnvelopeShape) -> Self {
        Self {
            store: ConversationStore::new(),
            transport,
            shape,
            notices: Vec::new(),
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn is_busy(&self) -> bool {
        self.store.is_busy()
    }

    /// Drain the notices produced since the last call
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Send one message and wait for the webhook's reply
    pub async fn send(&mut self, content: &str, attachments: Vec<AttachmentFile>) -> SendOutcome {
        match self.begin(content, attachments) {
            Some(pending) => self.complete(pending).await,
            None => SendOutcome::Ignored,
        }
    }

    /// Log the user message and mark the store busy. Returns `None` when
    /// there is neither text nor an attachment to send.
    pub fn begin(&mut self, content: &str, attachments: Vec<AttachmentFile>) -> Option<PendingSend> {
        if content.trim().is_empty() && attachments.is_empty() {
            return None;
        }

        let timestamp = now_millis();
        let id = self.store.next_message_id(timestamp);
        self.store.append(Message::user(
            id,
            content.to_string(),
            attachments.clone(),
            timestamp,
        ));
        self.store.set_busy(true);

        Some(PendingSend {
            content: content.to_string(),
            timestamp,
            attachments,
        })
    }

    /// Encode, post and record the reply for a send started with `begin`.
    /// The busy flag is always cleared.
    pub async fn complete(&mut self, pending: PendingSend) -> SendOutcome {
        let outcome = match self.dispatch(&pending).await {
            Ok(reply) => {
                let timestamp = now_millis();
                let id = self.store.next_message_id(timestamp);
                self.store.append(Message::assistant(
                    id,
                    reply.response_text().to_string(),
                    timestamp,
                ));
                SendOutcome::Replied
            }
            Err(err) => {
                tracing::warn!(error = %err, encoding = err.is_encoding(), "Send failed");
                self.notices.push(Notice::error(SEND_FAILED, err.to_string()));
                SendOutcome::Failed
            }
        };

        self.store.set_busy(false);
        outcome
    }

    async fn dispatch(&mut self, pending: &PendingSend) -> Result<WebhookReply, ChatError> {
        let thread_id = self
            .store
            .thread_id()
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let attachments = encode_attachments(&pending.attachments).await?;
        let body = Envelope::new(
            pending.content.clone(),
            thread_id.clone(),
            pending.timestamp,
            attachments,
        )
        .to_body(self.shape)?;

        tracing::info!(
            thread_id = %thread_id,
            attachments = pending.attachments.len(),
            "Sending message to webhook"
        );

        let text = self.transport.post_json(body).await?;
        let reply = WebhookReply::parse(&text)?;

        match &reply.thread_id {
            Some(server_id) if *server_id != thread_id => {
                tracing::info!(thread_id = %server_id, "Webhook assigned a new thread id");
            }
            _ => {}
        }
        self.store
            .set_thread_id(reply.thread_id.clone().unwrap_or(thread_id));

        Ok(reply)
    }

    /// Drop every message and the thread id
    pub fn clear_conversation(&mut self) {
        self.store.clear();
        tracing::info!("Conversation cleared");
        self.notices.push(Notice::success(CLEARED));
    }
}
