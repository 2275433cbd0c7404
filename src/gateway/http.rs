//! HTTP row source: JSON POST to a single endpoint

use tracing::{debug, warn};

use super::{envelope, RowSource, TableQuery};
use crate::types::{Result, RevdashError, Row};

/// Row source backed by the remote data endpoint
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGateway {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("revdash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RevdashError::Transport(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RowSource for HttpGateway {
    async fn fetch_rows(&self, query: &TableQuery) -> Result<Vec<Row>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(query)
            .send()
            .await
            .map_err(|e| {
                RevdashError::Transport(format!("{} request failed: {}", query.table_name, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            // Body is still decoded; error envelopes fall through to no rows
            warn!(table = %query.table_name, %status, "endpoint returned non-success status");
        }

        let body = response.text().await.map_err(|e| {
            RevdashError::Transport(format!("{} response read failed: {}", query.table_name, e))
        })?;

        let rows = envelope::decode_rows(&body);
        debug!(table = %query.table_name, rows = rows.len(), "fetched rows");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the request body
    async fn serve_once(status: &'static str, body: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

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

        (format!("http://{}/query", addr), handle)
    }

    /// Read headers plus a Content-Length body, return the body
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(split) = text.find("\r\n\r\n") {
                let content_length = text[..split]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if buf.len() >= split + 4 + content_length {
                    return text[split + 4..split + 4 + content_length].to_string();
                }
            }
        }
        String::new()
    }

    #[tokio::test]
    async fn test_fetch_rows_sends_query_and_unwraps_envelope() {
        let body = json!({"data": [{"id": 1}, {"id": 2}]}).to_string();
        let (url, server) = serve_once("200 OK", body).await;

        let gateway = HttpGateway::new(url).unwrap();
        let query = TableQuery::new("users")
            .columns(&["id", "email"])
            .filter("is_admin", false);
        let rows = gateway.fetch_rows(&query).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], 1);

        let sent: Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(sent["table_name"], "users");
        assert_eq!(sent["columns"], json!(["id", "email"]));
        assert_eq!(sent["filters"], json!({"is_admin": false}));
    }

    #[tokio::test]
    async fn test_fetch_rows_non_json_body_is_empty() {
        let (url, server) = serve_once("200 OK", "<html>maintenance</html>".into()).await;

        let gateway = HttpGateway::new(url).unwrap();
        let rows = gateway.fetch_rows(&TableQuery::new("users")).await.unwrap();

        assert!(rows.is_empty());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_rows_error_status_decodes_body() {
        let body = json!({"error": "boom"}).to_string();
        let (url, server) = serve_once("500 Internal Server Error", body).await;

        let gateway = HttpGateway::new(url).unwrap();
        let rows = gateway.fetch_rows(&TableQuery::new("users")).await.unwrap();

        assert!(rows.is_empty());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_rows_connection_refused_is_transport_error() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gateway = HttpGateway::new(format!("http://{}/query", addr)).unwrap();
        let err = gateway
            .fetch_rows(&TableQuery::new("users"))
            .await
            .unwrap_err();

        assert!(matches!(err, RevdashError::Transport(_)));
        assert!(err.to_string().contains("users"));
    }
}
