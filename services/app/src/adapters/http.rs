//! services/app/src/adapters/http.rs
//!
//! Adapters for the remote REST API. They implement the `AuthApi` and
//! `AnimalSource` ports from the `core` crate on top of `reqwest`.

use adoption_core::domain::{Animal, AuthSnapshot};
use adoption_core::ports::{AnimalSource, AuthApi, PortError, PortResult};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, info};

/// Shown when the server rejects a request without explaining why.
pub const GENERIC_FAILURE: &str = "Erro ao conectar com o servidor";

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Extracts the `error` field from a failure body, falling back to a generic
/// message when the body is not JSON or carries no usable text.
pub fn rejection_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|e| e.as_str())
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> PortResult<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(format!("invalid response body: {}", e)));
    }

    let body = response.text().await.unwrap_or_default();
    let message = rejection_message(&body);
    error!(%status, %message, "remote API rejected the request");
    Err(PortError::Rejected(message))
}

fn transport_error(e: reqwest::Error) -> PortError {
    error!("Remote API unreachable: {:?}", e);
    PortError::Rejected(GENERIC_FAILURE.to_string())
}

//=========================================================================================
// HttpAuthApi
//=========================================================================================

#[derive(Clone)]
pub struct HttpAuthApi {
    client: Client,
    base_url: String,
}

impl HttpAuthApi {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, email: &str, password: &str) -> PortResult<AuthSnapshot> {
        info!(email, "POST /auth/login");
        let response = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&LoginBody { email, password })
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> PortResult<AuthSnapshot> {
        info!(email, "POST /auth/register");
        let response = self
            .client
            .post(format!("{}/auth/register", self.base_url))
            .json(&RegisterBody {
                name,
                email,
                password,
            })
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }
}

//=========================================================================================
// HttpAnimalSource
//=========================================================================================

#[derive(Clone)]
pub struct HttpAnimalSource {
    client: Client,
    base_url: String,
}

impl HttpAnimalSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AnimalSource for HttpAnimalSource {
    async fn fetch_all(&self) -> PortResult<Vec<Animal>> {
        let response = self
            .client
            .get(format!("{}/animals", self.base_url))
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::session::RemoteAuth;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const SNAPSHOT_BODY: &str =
        r#"{"token":"tok-1","user":{"id":"42","name":"Ana","email":"ana@x.com"}}"#;

    /// Answers exactly one request on a local port with a canned response.
    /// The handle resolves to the raw request that was received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&request[..end]).to_string();
                    let length = head
                        .lines()
                        .filter_map(|line| line.split_once(':'))
                        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).to_string()
        });

        (base_url, handle)
    }

    #[tokio::test]
    async fn login_posts_credentials_and_decodes_the_snapshot() {
        let (base_url, server) = serve_once("200 OK", SNAPSHOT_BODY).await;
        let api = HttpAuthApi::new(Client::new(), base_url);

        let snapshot = api.login("ana@x.com", "pwd123").await.unwrap();
        assert_eq!(snapshot.token, "tok-1");
        assert_eq!(snapshot.user.id, "42");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /auth/login "), "{}", request);
        assert!(request.contains(r#""email":"ana@x.com""#));
        assert!(request.contains(r#""password":"pwd123""#));
    }

    #[tokio::test]
    async fn client_error_carries_the_body_error_text() {
        let (base_url, server) =
            serve_once("409 Conflict", r#"{"error":"Email já cadastrado"}"#).await;
        let api = HttpAuthApi::new(Client::new(), base_url);

        let err = api.register("Ana", "ana@x.com", "pwd123").await.unwrap_err();
        assert!(matches!(&err, PortError::Rejected(m) if m == "Email já cadastrado"), "{:?}", err);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /auth/register "), "{}", request);
        assert!(request.contains(r#""name":"Ana""#));
    }

    #[tokio::test]
    async fn server_error_without_json_uses_the_generic_text() {
        let (base_url, server) = serve_once("500 Internal Server Error", "<html>oops</html>").await;
        let source = HttpAnimalSource::new(Client::new(), base_url);

        let err = source.fetch_all().await.unwrap_err();
        assert!(matches!(&err, PortError::Rejected(m) if m == GENERIC_FAILURE), "{:?}", err);
        assert!(server.await.unwrap().starts_with("GET /animals "));
    }

    #[tokio::test]
    async fn remote_sign_in_over_http_keeps_the_token() {
        let (base_url, server) = serve_once("200 OK", SNAPSHOT_BODY).await;
        let auth = RemoteAuth::new(
            Arc::new(HttpAuthApi::new(Client::new(), base_url)),
            Arc::new(MemoryStore::new()),
        );

        let user = auth.sign_in("ana@x.com", "pwd123").await.unwrap();
        assert_eq!(user.email, "ana@x.com");
        assert_eq!(auth.token().await.unwrap().as_deref(), Some("tok-1"));
        server.await.unwrap();
    }

    #[test]
    fn rejection_message_uses_error_field() {
        assert_eq!(
            rejection_message(r#"{"error":"Email já cadastrado"}"#),
            "Email já cadastrado"
        );
    }

    #[test]
    fn rejection_message_defaults_when_field_is_missing_or_blank() {
        assert_eq!(rejection_message(r#"{"message":"nope"}"#), GENERIC_FAILURE);
        assert_eq!(rejection_message(r#"{"error":"  "}"#), GENERIC_FAILURE);
        assert_eq!(rejection_message(r#"{"error":42}"#), GENERIC_FAILURE);
    }

    #[test]
    fn rejection_message_defaults_on_non_json_body() {
        assert_eq!(rejection_message("<html>502</html>"), GENERIC_FAILURE);
        assert_eq!(rejection_message(""), GENERIC_FAILURE);
    }
}
