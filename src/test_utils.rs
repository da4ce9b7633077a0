//! Helpers for driving the router like a browser in tests
use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use crate::config::Config;
use crate::errors::{ChartError, ChartResult};
use crate::macc::{ChartRenderer, MaccCurve};
use crate::router::build_router;
use crate::services::{AccountService, AccountStore, MemoryAccountStore};
use crate::state::AppState;

pub const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Stands in for plotters so route tests do not depend on system fonts.
#[derive(Debug, Clone, Copy)]
pub enum StubRenderer {
    Png,
    Fails,
    TimesOut,
}

#[async_trait]
impl ChartRenderer for StubRenderer {
    async fn render(&self, curve: MaccCurve) -> ChartResult<Vec<u8>> {
        match self {
            StubRenderer::Png => {
                let mut png = PNG_MAGIC.to_vec();
                png.extend_from_slice(curve.organisation.as_bytes());
                Ok(png)
            }
            StubRenderer::Fails => Err(ChartError::Render("backend unavailable".into())),
            StubRenderer::TimesOut => Err(ChartError::Timeout(30)),
        }
    }
}

/// State over an in-memory store with the admin account bootstrapped.
pub async fn test_state() -> AppState {
    test_state_with(Arc::new(MemoryAccountStore::default()), StubRenderer::Png).await
}

pub async fn test_state_with(store: Arc<dyn AccountStore>, renderer: StubRenderer) -> AppState {
    let config = Config::for_tests();
    let accounts = AccountService::new(store, &config.auth);
    accounts
        .bootstrap_admin(config.auth.admin_password.as_deref())
        .await
        .unwrap();
    AppState::new(accounts, config).with_renderer(Arc::new(renderer))
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

/// Sends requests through one router and keeps cookies between them.
pub struct TestClient {
    app: Router,
    cookies: HashMap<String, String>,
}

impl TestClient {
    pub fn new(state: AppState) -> Self {
        Self {
            app: build_router(state),
            cookies: HashMap::new(),
        }
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.send(Method::GET, path, Body::empty(), None).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let encoded = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        self.send(
            Method::POST,
            path,
            Body::from(encoded),
            Some("application/x-www-form-urlencoded"),
        )
        .await
    }

    async fn send(
        &mut self,
        method: Method,
        path: &str,
        body: Body,
        content_type: Option<&str>,
    ) -> TestResponse {
        let mut request = Request::builder().method(method).uri(path);
        if let Some(content_type) = content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }
        if !self.cookies.is_empty() {
            let cookie_header = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            request = request.header(header::COOKIE, cookie_header);
        }

        let response = self
            .app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let raw = set_cookie.to_str().unwrap();
            let pair = raw.split(';').next().unwrap_or_default();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let expired = raw.to_ascii_lowercase().contains("max-age=0");
            if value.is_empty() || expired {
                self.cookies.remove(name.trim());
            } else {
                self.cookies.insert(name.trim().to_string(), value.to_string());
            }
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|l| l.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            location,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}
