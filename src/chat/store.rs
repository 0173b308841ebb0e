use super::message::Message;

/// In-memory conversation state: the message log, the busy flag and the
/// thread id the webhook uses to correlate turns.
#[derive(Debug, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    is_busy: bool,
    thread_id: Option<String>,
    next_seq: u64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message at the end of the log
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Empty the log and forget the thread id
    pub fn clear(&mut self) {
        self.messages.clear();
        self.thread_id = None;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn is_busy(&self) -> bool {
        self.is_busy
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.is_busy = busy;
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn set_thread_id(&mut self, thread_id: String) {
        self.thread_id = Some(thread_id);
    }

    /// Produce a message id that is unique within this store, even for
    /// messages created in the same millisecond.
    pub fn next_message_id(&mut self, timestamp: i64) -> String {
        let seq = self.next_seq;
        self.next_seq += 1;
        format!("msg-{}-{}", timestamp, seq)
    }
}
