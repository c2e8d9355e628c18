//! [`LlmGateway`] over an OpenAI-compatible HTTP endpoint

use super::protocol::{ChatRequest, ChatResponse};
use async_trait::async_trait;
use consensus_application::ports::llm_gateway::{GatewayError, LlmGateway};
use consensus_domain::{Message, Model};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Longest error body kept in a [`GatewayError::Status`]
const MAX_ERROR_BODY: usize = 500;

/// Chat-completions gateway shared by every model of a run
pub struct OpenAiGateway {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiGateway {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .user_agent(concat!("llm-consensus/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    fn api_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

fn map_request_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::Connection(e.to_string())
    } else {
        GatewayError::RequestFailed(e.to_string())
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn query(
        &self,
        model: &Model,
        messages: &[Message],
        timeout: Duration,
    ) -> Result<String, GatewayError> {
        let request = ChatRequest::new(model.as_str(), messages);
        debug!(model = %model, messages = messages.len(), "Sending chat completion");

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: truncate_body(body.trim()),
            });
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::RequestFailed(format!("Invalid response body: {}", e))
            }
        })?;

        let content = body.joined_content();
        if content.trim().is_empty() {
            return Err(GatewayError::EmptyResponse);
        }

        debug!(model = %model, bytes = content.len(), "Chat completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
        delay: Duration,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            tokio::time::sleep(delay).await;
            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{}/v1/", addr), handle)
    }

    fn messages() -> Vec<Message> {
        vec![Message::system("be brief"), Message::user("6 x 7?")]
    }

    #[test]
    fn test_api_url_trims_trailing_slash() {
        let gateway = OpenAiGateway::new("https://api.example.com/v1/", "k").unwrap();
        assert_eq!(gateway.api_url(), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn test_truncate_body() {
        let long = "é".repeat(400);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= MAX_ERROR_BODY + 3);
    }

    #[tokio::test]
    async fn test_successful_query() {
        let (endpoint, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"42"}}]}"#,
            Duration::ZERO,
        )
        .await;

        let gateway = OpenAiGateway::new(endpoint, "secret-key").unwrap();
        let reply = gateway
            .query(&Model::new("openai/gpt-4o"), &messages(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(reply, "42");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/chat/completions"));
        assert!(request.to_lowercase().contains("authorization: bearer secret-key"));
        assert!(request.contains(r#""model":"openai/gpt-4o""#));
        assert!(request.contains(r#""role":"system""#));
    }

    #[tokio::test]
    async fn test_error_status() {
        let (endpoint, _server) = serve_once(
            "HTTP/1.1 429 Too Many Requests",
            r#"{"error":"rate limited"}"#,
            Duration::ZERO,
        )
        .await;

        let gateway = OpenAiGateway::new(endpoint, "k").unwrap();
        let err = gateway
            .query(&Model::new("m"), &messages(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::Status {
                status: 429,
                body: r#"{"error":"rate limited"}"#.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let (endpoint, _server) =
            serve_once("HTTP/1.1 200 OK", r#"{"choices":[]}"#, Duration::ZERO).await;

        let gateway = OpenAiGateway::new(endpoint, "k").unwrap();
        let err = gateway
            .query(&Model::new("m"), &messages(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::EmptyResponse);
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let (endpoint, _server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"choices":[{"message":{"content":"late"}}]}"#,
            Duration::from_secs(5),
        )
        .await;

        let gateway = OpenAiGateway::new(endpoint, "k").unwrap();
        let err = gateway
            .query(&Model::new("m"), &messages(), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gateway = OpenAiGateway::new(format!("http://{}", addr), "k").unwrap();
        let err = gateway
            .query(&Model::new("m"), &messages(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Connection(_)));
    }
}
