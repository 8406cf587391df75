//! Shared harness for the API tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use parkhub_api::{AppState, build_app};
use parkhub_core::config::AppConfig;
use parkhub_core::traits::ManualClock;
use parkhub_database::{MemoryStore, Repositories};
use parkhub_realtime::NotificationHub;
use parkhub_service::ServiceContext;

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0)
        .single()
        .expect("valid")
}

pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub hub: NotificationHub,
}

impl TestApp {
    pub async fn new(now: DateTime<Utc>, spots: u32) -> Self {
        let config = Arc::new(AppConfig::default());
        let store = Arc::new(MemoryStore::new());
        store.seed_spots(spots).await;
        let clock = Arc::new(ManualClock::new(now));
        let hub = NotificationHub::start(&config.realtime);
        let ctx = ServiceContext::new(
            Repositories::memory(store.clone()),
            clock.clone(),
            Some(Arc::new(hub.clone())),
            config.allocation.clone(),
            config.scheduler.clone(),
        );
        let state = AppState::new(config.clone(), hub.clone(), ctx);
        let app = build_app(state, &config.server.cors);
        Self {
            app,
            store,
            clock,
            hub,
        }
    }

    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}
