#![allow(dead_code)]

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Executor, PgPool};
use tower::ServiceExt;

use penpals_api::config::AppConfig;
use penpals_api::database::{MemoryStore, PgStore, Store};
use penpals_api::services::billing::{CheckoutRequest, CheckoutSession, PaymentError, PaymentGateway};
use penpals_api::services::reply::{CompletionClient, CompletionError};
use penpals_api::services::ReplyGenerator;
use penpals_api::AppState;

pub const WEBHOOK_SECRET: &str = "whsec_integration";
pub const CANNED_REPLY: &str = "Hello from the North Pole! Love, your elf";

/// Completion client that always answers with the same text
pub struct CannedCompletion(pub String);

#[async_trait]
impl CompletionClient for CannedCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        Ok(self.0.clone())
    }
}

pub struct FailingCompletion;

#[async_trait]
impl CompletionClient for FailingCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        Err(CompletionError::Status(503))
    }
}

/// Payment gateway that records every checkout request
#[derive(Default)]
pub struct FakePayments {
    pub requests: Mutex<Vec<CheckoutRequest>>,
}

impl FakePayments {
    pub fn recorded(&self) -> Vec<CheckoutRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakePayments {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        let id = format!("cs_test_{}", requests.len());
        Ok(CheckoutSession {
            url: Some(format!("https://checkout.test/{id}")),
            id,
        })
    }
}

pub struct TestApp<S = MemoryStore> {
    pub router: Router,
    pub store: Arc<S>,
    pub payments: Arc<FakePayments>,
    pub config: AppConfig,
}

pub struct Family {
    pub parent_token: String,
    pub parent_id: i64,
    pub parent_code: String,
    pub kid_token: String,
    pub kid_id: i64,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.api.enable_rate_limiting = false;
    config.server.static_dir = None;
    config.billing.frontend_url = "https://penpals.test".to_string();
    config.billing.stripe_webhook_secret = Some(WEBHOOK_SECRET.to_string());
    config
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config(), Arc::new(CannedCompletion(CANNED_REPLY.to_string()))).await
}

pub async fn spawn_app_with(config: AppConfig, completion: Arc<dyn CompletionClient>) -> TestApp {
    let store = Arc::new(MemoryStore::with_sample_elves().await);
    TestApp::over(store, config, completion)
}

/// App over a fresh Postgres schema seeded with the sample elves.
///
/// `None` when `DATABASE_URL` is unset so the suite still runs without a server.
pub async fn spawn_pg_app() -> Result<Option<(TestApp<PgStore>, PgPool)>> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres-backed test");
        return Ok(None);
    };

    let schema = format!("penpals_test_{}", uuid::Uuid::new_v4().simple());
    let admin = PgPool::connect(&url).await.context("connect to DATABASE_URL")?;
    admin.execute(format!("CREATE SCHEMA {schema}").as_str()).await?;
    admin.close().await;

    let options = PgConnectOptions::from_str(&url)?.options([("search_path", schema.as_str())]);
    let pool = PgPoolOptions::new().max_connections(4).connect_with(options).await?;
    pool.execute(include_str!("../../schema.sql")).await.context("apply schema.sql")?;
    pool.execute(
        "INSERT INTO elves (name, job, personality, emoji) VALUES \
         ('Jingle', 'Toy Workshop Lead', 'cheerful and full of giggles', '🧝'), \
         ('Tinsel', 'Reindeer Keeper', 'gentle and patient', '🦌'), \
         ('Sprinkle', 'Cookie Baker', 'curious and a little silly', '🍪')",
    )
    .await?;

    let store = Arc::new(PgStore::new(pool.clone()));
    let app = TestApp::over(store, test_config(), Arc::new(CannedCompletion(CANNED_REPLY.to_string())));
    Ok(Some((app, pool)))
}

impl<S: Store + 'static> TestApp<S> {
    pub fn over(store: Arc<S>, config: AppConfig, completion: Arc<dyn CompletionClient>) -> Self {
        let payments = Arc::new(FakePayments::default());

        let dyn_store: Arc<dyn Store> = store.clone();
        let dyn_payments: Arc<dyn PaymentGateway> = payments.clone();
        let state = AppState::new(config.clone(), dyn_store, ReplyGenerator::new(completion), dyn_payments);

        TestApp {
            router: penpals_api::app(state),
            store,
            payments,
            config,
        }
    }
}

impl<S> TestApp<S> {
    pub async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| {
                format!("response was not JSON: {}", String::from_utf8_lossy(&bytes))
            })?
        };
        Ok((status, body))
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };
        self.send(request).await
    }

    /// GET as if the request arrived from `peer`; the rate limiter keys on it
    pub async fn get_from(&self, uri: &str, peer: SocketAddr) -> Result<(StatusCode, Value)> {
        let mut request = Request::builder().method(Method::GET).uri(uri).body(Body::empty())?;
        request.extensions_mut().insert(ConnectInfo(peer));
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    /// Register a parent and return `(token, user)`
    pub async fn register_parent(&self, email: &str) -> Result<(String, Value)> {
        let (status, body) = self
            .post(
                "/api/auth/parent/register",
                None,
                json!({ "email": email, "password": "candy-cane-42", "name": "Pat Parent" }),
            )
            .await?;
        assert_eq!(status, StatusCode::OK, "parent registration failed: {body}");
        let token = body["data"]["token"].as_str().context("missing token")?.to_string();
        Ok((token, body["data"]["user"].clone()))
    }

    /// Register a kid under `parent_code` and return `(token, user)`
    pub async fn register_kid(&self, parent_code: &str, username: &str) -> Result<(String, Value)> {
        let (status, body) = self
            .post(
                "/api/auth/kid/register",
                None,
                json!({
                    "username": username,
                    "password": "snowball",
                    "name": "Sam Kid",
                    "age": 7,
                    "parentCode": parent_code
                }),
            )
            .await?;
        assert_eq!(status, StatusCode::OK, "kid registration failed: {body}");
        let token = body["data"]["token"].as_str().context("missing token")?.to_string();
        Ok((token, body["data"]["user"].clone()))
    }

    /// A parent with one registered kid
    pub async fn family(&self, email: &str, username: &str) -> Result<Family> {
        let (parent_token, parent) = self.register_parent(email).await?;
        let parent_code = parent["parent_code"].as_str().context("missing parent_code")?.to_string();
        let (kid_token, kid) = self.register_kid(&parent_code, username).await?;
        Ok(Family {
            parent_token,
            parent_id: parent["id"].as_i64().context("missing parent id")?,
            parent_code,
            kid_token,
            kid_id: kid["id"].as_i64().context("missing kid id")?,
        })
    }

    pub async fn select_elf(&self, kid_token: &str, elf_id: i64) -> Result<()> {
        let (status, body) = self
            .post("/api/elves/select", Some(kid_token), json!({ "elfId": elf_id }))
            .await?;
        assert_eq!(status, StatusCode::OK, "elf selection failed: {body}");
        Ok(())
    }

    /// Submit a letter and return the stored letter from the response
    pub async fn send_letter(&self, kid_token: &str, content: &str) -> Result<Value> {
        let (status, body) = self
            .post("/api/letters", Some(kid_token), json!({ "content": content }))
            .await?;
        assert_eq!(status, StatusCode::OK, "letter submission failed: {body}");
        Ok(body["data"]["letter"].clone())
    }
}
