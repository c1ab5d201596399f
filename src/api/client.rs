use std::{
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{
    header::{
        CONTENT_TYPE,
        USER_AGENT,
    },
    Client,
    Method,
    StatusCode,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    service::FlashcardService,
    types::{
        CardBody,
        ErrorBody,
        ReviewBody,
        ServiceMessage,
    },
};
use crate::core::{
    CardId,
    CardpopError,
    ConfigStore,
    Flashcard,
    Grade,
};

const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP client for the flashcard service. The base URL is read from the config
/// store on every call and the session cookie travels with every request.
pub struct RemoteServiceClient {
    http: Client,
    config: Arc<ConfigStore>,
}

impl RemoteServiceClient {
    pub fn new(config: Arc<ConfigStore>) -> Result<Self, CardpopError> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CardpopError::Custom(format!("HTTP client build failed: {e}")))?;
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url().trim_end_matches('/'), path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, CardpopError> {
        let url = self.url(path);
        debug!("[Service] {} {}", method, url);

        let mut request = self
            .http
            .request(method, &url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(USER_AGENT, "cardpop/0.1 (+reqwest)");
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(&body)?);
        }

        let response = request.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let text = response.text().await?;

        if !status.is_success() {
            return Err(classify_error(status, content_type.as_deref(), &text));
        }

        if text.trim().is_empty() {
            return Ok(serde_json::from_str("{}")?);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Builds the error for a non-2xx response. JSON bodies surface their `detail`
/// field, anything else surfaces the raw text. The status is always attached,
/// including for the empty-queue sentinel (see `CardpopError::is_no_cards`).
pub fn classify_error(status: StatusCode, content_type: Option<&str>, body: &str) -> CardpopError {
    let is_json = content_type.map(|ct| ct.contains(JSON_CONTENT_TYPE)).unwrap_or(false);

    let message = if is_json {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.detail_message())
            .unwrap_or_else(|| body.to_string())
    } else {
        body.to_string()
    };

    CardpopError::Service {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("").to_string(),
        message,
    }
}

#[async_trait]
impl FlashcardService for RemoteServiceClient {
    async fn fetch_next(&self) -> Result<Flashcard, CardpopError> {
        self.send(Method::GET, "/next", None).await
    }

    async fn review(&self, card_id: CardId, grade: Grade) -> Result<ServiceMessage, CardpopError> {
        let body = serde_json::to_value(ReviewBody { grade })?;
        self.send(Method::POST, &format!("/review/{card_id}"), Some(body)).await
    }

    async fn edit(
        &self,
        card_id: CardId,
        front: &str,
        back: &str,
    ) -> Result<ServiceMessage, CardpopError> {
        let body = serde_json::to_value(CardBody { card_front: front, card_back: back })?;
        self.send(Method::PUT, &format!("/edit/{card_id}"), Some(body)).await
    }

    async fn add(&self, front: &str, back: &str) -> Result<ServiceMessage, CardpopError> {
        let body = serde_json::to_value(CardBody { card_front: front, card_back: back })?;
        self.send(Method::POST, "/add", Some(body)).await
    }

    async fn delete(&self, card_id: CardId) -> Result<ServiceMessage, CardpopError> {
        self.send(Method::DELETE, &format!("/delete/{card_id}"), None).await
    }

    async fn list(&self) -> Result<Vec<Flashcard>, CardpopError> {
        self.send(Method::GET, "/list", None).await
    }

    async fn validate_authentication(&self) -> Result<ServiceMessage, CardpopError> {
        self.send(Method::GET, "/validate-authentication", None).await
    }

    async fn logout(&self) -> Result<ServiceMessage, CardpopError> {
        self.send(Method::GET, "/logout", None).await
    }

    fn login_url(&self) -> String {
        self.url("/login")
    }
}

#[cfg(test)]
mod tests {
    use tokio::{
        io::{
            AsyncReadExt,
            AsyncWriteExt,
        },
        net::TcpListener,
    };

    use super::*;
    use crate::core::config::CONFIG_FILE;

    #[test]
    fn test_json_errors_surface_detail() {
        let error = classify_error(
            StatusCode::BAD_REQUEST,
            Some("application/json; charset=utf-8"),
            r#"{"detail": "Card not found"}"#,
        );
        match error {
            CardpopError::Service { status, status_text, message } => {
                assert_eq!(status, 400);
                assert_eq!(status_text, "Bad Request");
                assert_eq!(message, "Card not found");
            }
            other => panic!("Expected Service, got {:?}", other),
        }
    }

    #[test]
    fn test_text_errors_surface_raw_body() {
        let error = classify_error(StatusCode::BAD_GATEWAY, Some("text/html"), "<h1>down</h1>");
        assert_eq!(error.status(), Some(502));
        assert!(error.to_string().starts_with("<h1>down</h1>"));
    }

    #[test]
    fn test_empty_queue_is_the_sentinel() {
        let error = classify_error(
            StatusCode::NOT_FOUND,
            Some("application/json"),
            r#"{"detail": "No cards to review right now."}"#,
        );
        assert!(error.is_no_cards());
        assert_eq!(error.status(), Some(404));
        assert!(matches!(
            error,
            CardpopError::Service { ref status_text, ref message, .. }
                if status_text == "Not Found" && message == "No cards to review right now."
        ));
    }

    /// Serves one canned HTTP response and returns the raw request it received.
    async fn serve_once(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                received.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&received).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if received.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            String::from_utf8_lossy(&received).to_string()
        });
        (format!("http://{addr}/"), handle)
    }

    fn client_for(base_url: &str, dir: &tempfile::TempDir) -> RemoteServiceClient {
        let store = Arc::new(ConfigStore::load(dir.path().join(CONFIG_FILE)));
        let mut config = store.get();
        config.base_url = base_url.to_string();
        store.set(config).unwrap();
        RemoteServiceClient::new(store).unwrap()
    }

    #[tokio::test]
    async fn test_review_posts_json_grade() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 20\r\nconnection: close\r\n\r\n{\"message\":\"saved\"}\n",
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let client = client_for(&base_url, &dir);

        let reply = client.review(42, Grade::High).await.unwrap();
        assert_eq!(reply.message, "saved");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /review/42 HTTP/1.1"));
        assert!(request.to_lowercase().contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"grade":3}"#));
    }

    #[tokio::test]
    async fn test_non_json_failure_keeps_status() {
        let (base_url, _server) = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\ncontent-type: text/plain\r\ncontent-length: 11\r\nconnection: close\r\n\r\nmaintenance",
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let client = client_for(&base_url, &dir);

        match client.fetch_next().await {
            Err(CardpopError::Service { status, message, .. }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("Expected Service error, got {:?}", other),
        }
    }

    #[test]
    fn test_login_url_uses_stored_base() {
        let dir = tempfile::tempdir().unwrap();
        let client = client_for("https://cards.example/", &dir);
        assert_eq!(client.login_url(), "https://cards.example/login");
    }
}
