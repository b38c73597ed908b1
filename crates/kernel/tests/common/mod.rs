#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Each [`TestApp`] runs the REAL kernel routes, registry and session layer.
//! Only the edges are swapped: objects live in a [`MemoryObjectStore`], the
//! translation cache lives in a temporary directory, and the identity
//! provider is [`FakeProvider`].

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use vitrine_kernel::AppState;
use vitrine_kernel::auth::{AuthError, IdentityProvider, UserProfile};
use vitrine_kernel::session::{SessionSettings, with_memory_sessions};
use vitrine_kernel::state::StateParts;
use vitrine_kernel::storage::{MemoryObjectStore, ObjectStore};
use vitrine_kernel::theme::ThemeEngine;
use vitrine_kernel::translation::{LocalTranslationCache, TranslationRegistry};

pub const TEST_BUCKET: &str = "vitrine-test";
pub const TEST_REGION: &str = "eu-west-1";
pub const TEST_MAX_UPLOAD_BYTES: usize = 1024 * 1024;
pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Authorization code the fake provider accepts.
pub const GOOD_CODE: &str = "good";

/// Identity provider that accepts [`GOOD_CODE`] and rejects everything else.
pub struct FakeProvider;

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "test"
    }

    fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        Ok(format!("https://idp.test/authorize?state={state}"))
    }

    async fn exchange(&self, code: &str) -> Result<UserProfile, AuthError> {
        if code != GOOD_CODE {
            return Err(AuthError::Exchange(anyhow::anyhow!("invalid code")));
        }
        Ok(UserProfile {
            id: "42".to_string(),
            display_name: "Ada Lovelace".to_string(),
            email: None,
            picture: None,
            provider: "test".to_string(),
        })
    }
}

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryObjectStore>,
    pub state: AppState,
    cache_dir: TempDir,
}

impl TestApp {
    /// Create a test app with an empty object store.
    pub async fn new() -> Self {
        Self::with_store(MemoryObjectStore::new(TEST_BUCKET, TEST_REGION)).await
    }

    /// Create a test app over a pre-populated object store.
    ///
    /// The translation registry is bootstrapped, as on startup.
    pub async fn with_store(store: MemoryObjectStore) -> Self {
        let cache_dir = tempfile::tempdir().expect("Failed to create cache dir");
        Self::build(Arc::new(store), cache_dir).await
    }

    /// Create a test app whose translation cache directory already exists.
    pub async fn with_cache_dir(store: MemoryObjectStore, cache_dir: TempDir) -> Self {
        Self::build(Arc::new(store), cache_dir).await
    }

    async fn build(store: Arc<MemoryObjectStore>, cache_dir: TempDir) -> Self {
        let object_store: Arc<dyn ObjectStore> = store.clone();

        let cache = LocalTranslationCache::open(cache_dir.path())
            .await
            .expect("Failed to open translation cache");
        let translations = Arc::new(
            TranslationRegistry::new(
                vec!["en".to_string(), "es".to_string()],
                cache,
                object_store.clone(),
            )
            .expect("Failed to create registry"),
        );
        translations.bootstrap().await;

        let theme = ThemeEngine::new(&templates_dir()).expect("Failed to load templates");

        let state = AppState::from_parts(StateParts {
            store: object_store,
            identity: Arc::new(FakeProvider),
            theme,
            translations,
            max_upload_bytes: TEST_MAX_UPLOAD_BYTES,
        });

        // Must match main.rs, minus Redis and Secure cookies.
        let settings = SessionSettings::new(TEST_SECRET, false);
        let router = with_memory_sessions(vitrine_kernel::routes::app(state.clone()), &settings);

        Self {
            router,
            store,
            state,
            cache_dir,
        }
    }

    /// Directory backing the local translation cache.
    pub fn cache_dir(&self) -> &Path {
        self.cache_dir.path()
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Send a request with cookies from a previous response.
    pub async fn request_with_cookies(&self, mut request: Request<Body>, cookies: &str) -> Response {
        if !cookies.is_empty() {
            request.headers_mut().insert(
                header::COOKIE,
                cookies.parse().expect("Invalid cookie header"),
            );
        }
        self.request(request).await
    }

    /// Start the OAuth flow and return `(state, cookies)`.
    pub async fn start_login(&self) -> (String, String) {
        let response = self
            .request(Request::get("/auth/test").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = location(&response);
        let state = location
            .split_once("state=")
            .map(|(_, s)| s.to_string())
            .expect("authorize URL carries a state");

        (state, extract_cookies(&response))
    }

    /// Log in through the real OAuth callback and return session cookies.
    pub async fn login(&self) -> String {
        let (state, cookies) = self.start_login().await;

        let response = self
            .request_with_cookies(
                Request::get(format!("/auth/test/callback?code={GOOD_CODE}&state={state}"))
                    .body(Body::empty())
                    .unwrap(),
                &cookies,
            )
            .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dashboard", "login failed");

        extract_cookies(&response)
    }
}

/// Project-level templates directory.
pub fn templates_dir() -> PathBuf {
    // Tests run from crates/kernel/, so go up two levels.
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent() // crates/
        .and_then(|p| p.parent()) // project root
        .unwrap_or(Path::new("."))
        .join("templates")
}

/// Extract cookies from response headers.
pub fn extract_cookies(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| {
            // Extract just the cookie name=value, ignoring attributes
            cookie.split(';').next()
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Location header of a redirect.
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Collect a response body as a string.
pub async fn response_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Collect a response body as JSON.
pub async fn response_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Build a multipart body with one text field and, optionally, one file.
pub fn multipart_body(
    boundary: &str,
    file: Option<(&str, &str, &str, &[u8])>,
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n"
        )
        .as_bytes(),
    );
    if let Some((field, filename, content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
