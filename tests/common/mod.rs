#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use clubdesk::api::AppState;
use clubdesk::config::Config;
use clubdesk::services::notification::DeliveryReceipt;
use clubdesk::services::{
    FixedCode, ImageHost, ImageHostError, NotificationSender, OutgoingMail, SendError,
};
use clubdesk::state::Collaborators;
use http_body_util::BodyExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tower::ServiceExt;

pub const TEST_CODE: &str = "123456";

/// Records every message instead of delivering it.
#[derive(Default)]
pub struct Outbox {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl Outbox {
    pub async fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().await.clone()
    }

    /// Polls until `count` messages arrived; background sends land after the response.
    pub async fn wait_for(&self, count: usize) -> Vec<OutgoingMail> {
        for _ in 0..100 {
            let sent = self.sent().await;
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        self.sent().await
    }
}

#[async_trait]
impl NotificationSender for Outbox {
    async fn send(&self, mail: &OutgoingMail) -> Result<DeliveryReceipt, SendError> {
        self.sent.lock().await.push(mail.clone());
        Ok(DeliveryReceipt {
            message_id: "test".to_string(),
        })
    }
}

/// Hands out predictable URLs and counts uploads.
#[derive(Default)]
pub struct StubImageHost {
    uploads: AtomicUsize,
}

impl StubImageHost {
    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageHost for StubImageHost {
    async fn upload(&self, image: &str) -> Result<String, ImageHostError> {
        if image.trim().is_empty() {
            return Err(ImageHostError::InvalidImage);
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("https://img.test/{n}.png"))
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub outbox: Arc<Outbox>,
    pub images: Arc<StubImageHost>,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

pub async fn spawn_app() -> TestApp {
    let outbox = Arc::new(Outbox::default());
    let images = Arc::new(StubImageHost::default());

    let collaborators = Collaborators {
        notifier: outbox.clone(),
        image_host: images.clone(),
        codes: Arc::new(FixedCode(TEST_CODE.to_string())),
    };

    let state = clubdesk::api::create_app_state_with_collaborators(test_config(), collaborators)
        .await
        .expect("Failed to create app state");
    let router = clubdesk::api::router(state.clone()).await;

    TestApp {
        router,
        state,
        outbox,
        images,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

pub async fn send(app: &TestApp, request: Request<Body>) -> TestResponse {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Runs the request-then-verify signup flow for one account.
pub async fn sign_up(app: &TestApp, username: &str, email: &str, password: &str) {
    let res = send(
        app,
        json("POST", "/api/otp/request", serde_json::json!({ "email": email })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);

    let res = send(
        app,
        json(
            "POST",
            "/api/otp/verify",
            serde_json::json!({
                "email": email,
                "otp": TEST_CODE,
                "username": username,
                "password": password,
            }),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
}
