use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::credentials::CredentialStore;
use crate::error::{DeployError, DeployResult};

pub const DEFAULT_HOST: &str = "https://gateway.stackpath.com";

pub struct EdgeClient {
    pub base_url: String,
    pub store: CredentialStore,
    pub http: Client,
}

/// A fully read HTTP response. Status handling is left to the caller.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub url: String,
    pub body: String,
}

impl EdgeClient {
    pub fn new(base_url: &str, store: CredentialStore) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            http: Client::new(),
        }
    }

    /// Use `STACKPATH_HOST` when set, otherwise the production gateway.
    pub fn from_env(store: CredentialStore) -> Self {
        let host = std::env::var("STACKPATH_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        Self::new(&host, store)
    }

    /// Send a request and return the response whatever its status.
    ///
    /// The bearer token is read from the credential store on every call so a
    /// token refreshed earlier in the run is picked up. Transport failures are
    /// always reported as [`DeployError::Connection`].
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        resource: &str,
        body: Option<&B>,
    ) -> DeployResult<ApiResponse> {
        let url = format!("{}{}", self.base_url, resource);
        tracing::debug!("{} {}", method, url);

        let mut req = self
            .http
            .request(method, &url)
            .header("Accept", "application/json");

        if let Some(token) = self.store.load()?.access_token.filter(|t| !t.is_empty()) {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|source| self.connection_error(source))?;
        let status = resp.status();
        let url = resp.url().to_string();
        let body = resp
            .text()
            .await
            .map_err(|source| self.connection_error(source))?;

        tracing::debug!("HTTP response {} from {}", status, url);
        Ok(ApiResponse { status, url, body })
    }

    fn connection_error(&self, source: reqwest::Error) -> DeployError {
        DeployError::Connection {
            host: self.base_url.clone(),
            source,
        }
    }
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// `code` field of an error body, if the server sent one.
    pub fn error_code(&self) -> Option<i64> {
        serde_json::from_str::<Value>(&self.body)
            .ok()?
            .get("code")?
            .as_i64()
    }

    /// `message` field of the body, falling back to the status reason.
    pub fn message(&self) -> String {
        serde_json::from_str::<Value>(&self.body)
            .ok()
            .and_then(|v| v.get("message")?.as_str().map(str::to_string))
            .unwrap_or_else(|| {
                self.status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            })
    }

    /// Turn any non-2xx status into [`DeployError::Api`].
    pub fn error_for_status(self) -> DeployResult<Self> {
        if self.is_success() {
            return Ok(self);
        }
        Err(DeployError::Api {
            status: self.status.as_u16(),
            message: format!("{}. Original url {}", self.message(), self.url),
        })
    }

    pub fn json<T: DeserializeOwned>(&self) -> DeployResult<T> {
        serde_json::from_str(&self.body).map_err(|e| DeployError::Api {
            status: self.status.as_u16(),
            message: format!("Unexpected response body ({}). Original url {}", e, self.url),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_server::serve_once;
    use super::*;
    use crate::credentials::Credentials;
    use tempfile::tempdir;

    fn store_with_token(dir: &std::path::Path) -> CredentialStore {
        let store = CredentialStore::new(dir.join("credentials"));
        let mut creds = Credentials::new("id", "secret");
        creds.access_token = Some("test_access_token".to_string());
        store.save(&creds).unwrap();
        store
    }

    #[tokio::test]
    async fn attaches_bearer_token_and_json_body() {
        let dir = tempdir().unwrap();
        let (base, server) = serve_once(200, r#"{"script":{"id":"1"}}"#).await;
        let client = EdgeClient::new(&base, store_with_token(dir.path()));

        let resp = client
            .send(
                Method::POST,
                "/cdn/v1/stacks/1/sites/2/scripts",
                Some(&serde_json::json!({"name": "Test"})),
            )
            .await
            .unwrap();
        assert!(resp.is_success());

        let captured = server.await.unwrap();
        assert!(captured.head.starts_with("POST /cdn/v1/stacks/1/sites/2/scripts "));
        assert!(
            captured
                .head
                .to_ascii_lowercase()
                .contains("authorization: bearer test_access_token")
        );
        assert_eq!(captured.body, r#"{"name":"Test"}"#);
    }

    #[tokio::test]
    async fn error_for_status_embeds_message_and_url() {
        let dir = tempdir().unwrap();
        let (base, server) = serve_once(500, r#"{"message":"Internal Server Error"}"#).await;
        let client = EdgeClient::new(&base, store_with_token(dir.path()));

        let resp = client
            .send::<()>(Method::POST, "/error", None)
            .await
            .unwrap();
        server.await.unwrap();

        let err = resp.error_for_status().unwrap_err();
        match err {
            DeployError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(
                    message,
                    format!("Internal Server Error. Original url {}/error", base)
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn raw_response_exposes_error_code() {
        let dir = tempdir().unwrap();
        let (base, server) =
            serve_once(404, r#"{"code":5,"message":"Site script does not exist"}"#).await;
        let client = EdgeClient::new(&base, store_with_token(dir.path()));

        let resp = client
            .send::<()>(Method::PATCH, "/cdn/v1/stacks/1/sites/2/scripts/3", None)
            .await
            .unwrap();
        server.await.unwrap();

        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        assert_eq!(resp.error_code(), Some(5));
        assert_eq!(resp.message(), "Site script does not exist");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_connection_error() {
        let dir = tempdir().unwrap();
        // Bind then drop so the port is closed.
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let client = EdgeClient::new(&format!("http://{}", addr), store_with_token(dir.path()));

        let err = client
            .send::<()>(Method::GET, "/", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Connection { .. }));
    }
}
