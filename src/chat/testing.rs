//! Mock transport for exercising the dispatcher without a network

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::error::ChatError;
use super::transport::WebhookTransport;

/// Transport that returns queued replies and records every request body.
/// Clones share the same queues, so a test can keep one handle and give
/// the other to the dispatcher.
#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<Result<String, ChatError>>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply body
    pub fn queue_reply(&self, body: &str) {
        self.replies.lock().unwrap().push_back(Ok(body.to_string()));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: ChatError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Every request body posted so far, parsed as JSON
    pub fn recorded_requests(&self) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|body| serde_json::from_str(body).unwrap())
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl WebhookTransport for MockTransport {
    async fn post_json(&self, body: String) -> Result<String, ChatError> {
        self.requests.lock().unwrap().push(body);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ChatError::Status {
                    status: 500,
                    body: "no reply queued".to_string(),
                })
            })
    }
}
