use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

use super::error::ChatError;

const MAX_ERROR_BODY: usize = 200;

/// Sends an encoded envelope to the webhook and hands back the reply body
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post_json(&self, body: String) -> Result<String, ChatError>;
}

/// Optional extra header sent with every request, usually a credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeader {
    pub name: String,
    pub value: String,
}

/// reqwest-backed transport posting to a single webhook URL
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
}

impl HttpTransport {
    pub fn new(url: &str, auth: Option<&AuthHeader>) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(auth) = auth {
            let name = HeaderName::from_bytes(auth.name.as_bytes())
                .with_context(|| format!("Invalid header name '{}'", auth.name))?;
            let value = HeaderValue::from_str(&auth.value)
                .with_context(|| format!("Invalid value for header '{}'", auth.name))?;
            headers.insert(name, value);
        }

        Ok(Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            headers,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn post_json(&self, body: String) -> Result<String, ChatError> {
        tracing::debug!(url = %self.url, bytes = body.len(), "Posting to webhook");

        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ChatError::Status {
                status: status.as_u16(),
                body: excerpt(&text),
            });
        }

        Ok(text)
    }
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(MAX_ERROR_BODY).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{EnvelopeShape, MessageDispatcher, SendOutcome};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Answer the first request on a local port with `status` and `body`;
    /// the join handle yields the raw request as received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/webhook/chat", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (url, handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buf).into_owned()
    }

    fn dispatcher_for(url: &str, auth: Option<&AuthHeader>) -> anyhow::Result<MessageDispatcher> {
        let transport = HttpTransport::new(url, auth)?;
        Ok(MessageDispatcher::new(Box::new(transport), EnvelopeShape::Batch))
    }

    #[tokio::test]
    async fn test_server_error_status_is_reported() -> anyhow::Result<()> {
        let (url, server) = serve_once("500 Internal Server Error", "boom").await;
        let transport = HttpTransport::new(&url, None)?;

        let err = transport.post_json("[]".to_string()).await.unwrap_err();
        server.await?;

        match err {
            ChatError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected status error, got {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_server_error_leaves_only_user_message() -> anyhow::Result<()> {
        let (url, server) = serve_once("500 Internal Server Error", "boom").await;
        let mut dispatcher = dispatcher_for(&url, None)?;

        let outcome = dispatcher.send("Hello", Vec::new()).await;
        server.await?;

        assert_eq!(outcome, SendOutcome::Failed);
        assert_eq!(dispatcher.store().len(), 1);
        assert!(!dispatcher.is_busy());

        let notices = dispatcher.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_error());
        assert_eq!(notices[0].title, "Failed to send message");
        assert_eq!(
            notices[0].description.as_deref(),
            Some("webhook returned 500: boom")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_successful_reply_is_logged() -> anyhow::Result<()> {
        let (url, server) = serve_once("200 OK", r#"{"response":"Hi there"}"#).await;
        let mut dispatcher = dispatcher_for(&url, None)?;

        let outcome = dispatcher.send("Hello", Vec::new()).await;
        let request = server.await?;

        assert_eq!(outcome, SendOutcome::Replied);
        assert_eq!(dispatcher.store().len(), 2);
        assert_eq!(dispatcher.store().last().unwrap().content, "Hi there");
        assert!(request.starts_with("POST /webhook/chat "));
        assert!(request.contains("\r\n\r\n[{\"message\":\"Hello\""));
        Ok(())
    }

    #[tokio::test]
    async fn test_request_carries_content_type_and_custom_header() -> anyhow::Result<()> {
        let (url, server) = serve_once("200 OK", r#"{"response":"ok"}"#).await;
        let auth = AuthHeader {
            name: "X-Key".to_string(),
            value: "sekret".to_string(),
        };
        let mut dispatcher = dispatcher_for(&url, Some(&auth))?;

        dispatcher.send("Hello", Vec::new()).await;
        let request = server.await?.to_ascii_lowercase();

        assert!(request.contains("\r\ncontent-type: application/json\r\n"));
        assert!(request.contains("\r\nx-key: sekret\r\n"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_a_network_error() -> anyhow::Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("http://{}/webhook", listener.local_addr()?);
        drop(listener);

        let transport = HttpTransport::new(&url, None)?;
        let err = transport.post_json("[]".to_string()).await.unwrap_err();
        assert!(matches!(err, ChatError::Network(_)));
        Ok(())
    }

    #[test]
    fn test_default_headers() -> anyhow::Result<()> {
        let transport = HttpTransport::new("http://localhost:5678/webhook/chat", None)?;
        assert_eq!(transport.url(), "http://localhost:5678/webhook/chat");
        assert_eq!(transport.headers.len(), 1);
        assert_eq!(transport.headers[CONTENT_TYPE], "application/json");
        Ok(())
    }

    #[test]
    fn test_custom_header_is_merged() -> anyhow::Result<()> {
        let auth = AuthHeader {
            name: "Authorization".to_string(),
            value: "Bearer secret".to_string(),
        };
        let transport = HttpTransport::new("http://localhost/hook", Some(&auth))?;
        assert_eq!(transport.headers.len(), 2);
        assert_eq!(transport.headers["authorization"], "Bearer secret");
        assert_eq!(transport.headers[CONTENT_TYPE], "application/json");
        Ok(())
    }

    #[test]
    fn test_invalid_header_name_rejected() {
        let auth = AuthHeader {
            name: "Bad Header".to_string(),
            value: "x".to_string(),
        };
        assert!(HttpTransport::new("http://localhost/hook", Some(&auth)).is_err());
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let long = "x".repeat(500);
        let cut = excerpt(&long);
        assert_eq!(cut.len(), MAX_ERROR_BODY + 3);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt("  short  "), "short");
    }
}
