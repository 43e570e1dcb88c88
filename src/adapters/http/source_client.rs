//! reqwest-backed `SourcePort`. Plain GET, default client settings.

use crate::domain::DomainError;
use crate::ports::SourcePort;
use reqwest::Client;
use tracing::debug;

pub struct HttpSourceClient {
    client: Client,
}

impl HttpSourceClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpSourceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SourcePort for HttpSourceClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DomainError> {
        // `without_url` keeps API keys in query strings out of error messages.
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("request failed: {}", e.without_url())))?
            .error_for_status()
            .map_err(|e| DomainError::Transport(format!("upstream status: {}", e.without_url())))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| DomainError::Transport(format!("reading body: {}", e.without_url())))?;

        debug!(len = body.len(), "fetched upstream payload");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response on a random local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}/ajax/news.json", addr)
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let url = serve_once("HTTP/1.1 200 OK", r#"{"news":[]}"#).await;
        let body = HttpSourceClient::new().fetch(&url).await.unwrap();
        assert_eq!(body, br#"{"news":[]}"#);
    }

    #[tokio::test]
    async fn test_fetch_maps_error_status_to_transport() {
        let url = serve_once("HTTP/1.1 503 Service Unavailable", "busy").await;
        let err = HttpSourceClient::new().fetch(&url).await.unwrap_err();
        assert!(matches!(err, DomainError::Transport(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_hides_query() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{}/forecast?appid=secret-key", addr);
        let err = HttpSourceClient::new().fetch(&url).await.unwrap_err();
        match err {
            DomainError::Transport(msg) => assert!(!msg.contains("secret-key")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
