//! Shared test helpers for integration tests.

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use bytes::Bytes;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use sharegate_api::{AppState, build_app};
use sharegate_auth::jwt::JwtEncoder;
use sharegate_auth::token::TokenIssuer;
use sharegate_core::config::{
    AppConfig, AuthConfig, DatabaseConfig, DownloadQueueConfig, LocalStorageConfig, StorageConfig,
};
use sharegate_core::events::EventBus;
use sharegate_core::types::UserId;
use sharegate_database::Repositories;
use sharegate_storage::build_object_store;

pub const PUBLIC_URL: &str = "http://files.test";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Application state, for poking at the queue directly
    pub state: AppState,
    encoder: JwtEncoder,
    /// Keeps the object root alive
    _objects: TempDir,
}

impl TestApp {
    /// Create a new test application with default queue settings.
    pub async fn new() -> Self {
        Self::with_queue(DownloadQueueConfig::default()).await
    }

    /// Create a new test application with a custom download queue.
    pub async fn with_queue(download_queue: DownloadQueueConfig) -> Self {
        let objects = tempfile::tempdir().expect("Failed to create object root");

        let mut config = AppConfig {
            server: Default::default(),
            database: DatabaseConfig {
                url: "memory".into(),
                max_connections: 1,
                min_connections: 0,
                connect_timeout_seconds: 1,
                idle_timeout_seconds: 1,
            },
            auth: AuthConfig {
                jwt_secret: "integration-owner-secret".into(),
                token_secret: "integration-presign-secret".into(),
                leeway_seconds: 0,
            },
            tokens: Default::default(),
            storage: StorageConfig {
                provider: "local".into(),
                local: LocalStorageConfig {
                    root_path: objects.path().to_string_lossy().into_owned(),
                },
                s3: Default::default(),
            },
            download_queue,
            adoption: Default::default(),
            library: Default::default(),
            logging: Default::default(),
        };
        config.server.public_url = PUBLIC_URL.into();
        config.validate().expect("Invalid test config");

        let issuer = TokenIssuer::from_config(&config.auth);
        let built = build_object_store(&config, issuer.clone())
            .await
            .expect("Failed to build object store");
        let encoder = JwtEncoder::new(&config.auth);

        let state = AppState::new(
            config,
            Repositories::memory(),
            built,
            issuer,
            EventBus::new(64),
        );

        Self {
            router: build_app(state.clone()),
            state,
            encoder,
            _objects: objects,
        }
    }

    /// Access token for a fresh owner.
    pub fn owner_token(&self) -> String {
        self.encoder
            .generate_access_token(UserId::new(), 3600)
            .expect("Failed to sign access token")
    }

    /// Send a JSON request
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let raw = self.send(req).await;
        let body: Value = serde_json::from_slice(&raw.body).unwrap_or(Value::Null);
        TestResponse {
            status: raw.status,
            body,
        }
    }

    /// PUT raw bytes to a presigned upload URL.
    pub async fn put_bytes(&self, url: &str, bytes: &'static [u8]) -> TestResponse {
        let req = Request::builder()
            .method("PUT")
            .uri(path_of(url))
            .body(Body::from(bytes))
            .expect("Failed to build request");
        let raw = self.send(req).await;
        TestResponse {
            status: raw.status,
            body: serde_json::from_slice(&raw.body).unwrap_or(Value::Null),
        }
    }

    /// GET a presigned download URL (or any path) and collect the raw body.
    pub async fn get_raw(&self, url: &str) -> RawResponse {
        let req = Request::builder()
            .method("GET")
            .uri(path_of(url))
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> RawResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
            .await
            .expect("Failed to read body");
        RawResponse {
            status,
            headers,
            body,
        }
    }

    /// Upload `bytes` into the owner's library and return the file id.
    pub async fn library_file(&self, token: &str, file_name: &str, bytes: &'static [u8]) -> String {
        let grant = self
            .request(
                "POST",
                "/api/files/uploads",
                Some(json!({ "fileName": file_name })),
                Some(token),
            )
            .await;
        assert_eq!(grant.status, StatusCode::OK, "{}", grant.body);

        let upload_url = grant.str("uploadUrl");
        let object_name = grant.str("objectName");
        let stored = self.put_bytes(&upload_url, bytes).await;
        assert_eq!(stored.status, StatusCode::CREATED, "{}", stored.body);

        let file = self
            .request(
                "POST",
                "/api/files",
                Some(json!({ "objectName": object_name, "fileName": file_name })),
                Some(token),
            )
            .await;
        assert_eq!(file.status, StatusCode::CREATED, "{}", file.body);
        file.str("id")
    }
}

/// Strip the public base URL from a presigned link.
pub fn path_of(url: &str) -> &str {
    url.strip_prefix(PUBLIC_URL).unwrap_or(url)
}

/// Test response wrapper
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// A string field of `data`.
    pub fn str(&self, field: &str) -> String {
        self.body["data"][field]
            .as_str()
            .unwrap_or_else(|| panic!("missing data.{field} in {}", self.body))
            .to_string()
    }

    /// Machine-readable error code.
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

/// Unparsed response
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}
