//! Integration tests for the OpenAI-compatible generator.
//!
//! A stand-in provider is served with `axum` on a loopback port. It
//! records every request so tests can check what was sent.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tempfile::TempDir;

use tokendex_db::{Database, SqliteConfig};
use tokendex_economy::{EconomyConfig, EconomyController, EconomyError};
use tokendex_generator::{
    BackendKind, GeneratorBackend, GeneratorConfig, GeneratorError, LlmConfig, LlmGenerator,
    RarityWeights,
};
use tokendex_types::Rarity;

// =============================================================================
// Stand-in provider
// =============================================================================

#[derive(Debug, Clone)]
struct Recorded {
    path: &'static str,
    authorization: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct Provider {
    chat_reply: String,
    image_status: StatusCode,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl Provider {
    fn new(chat_reply: &str) -> Self {
        Self {
            chat_reply: chat_reply.to_owned(),
            image_status: StatusCode::OK,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn with_image_status(mut self, status: StatusCode) -> Self {
        self.image_status = status;
        self
    }

    fn record(&self, path: &'static str, headers: &HeaderMap, body: Value) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);
        self.requests.lock().unwrap().push(Recorded {
            path,
            authorization,
            body,
        });
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// Serve on a loopback port and return the base URL.
    async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/v1/chat/completions", post(chat))
            .route("/v1/images/generations", post(images))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{addr}/v1")
    }
}

async fn chat(
    State(provider): State<Provider>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    provider.record("chat", &headers, body);
    Json(json!({
        "choices": [{"message": {"role": "assistant", "content": provider.chat_reply}}]
    }))
}

async fn images(
    State(provider): State<Provider>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    provider.record("images", &headers, body);
    if provider.image_status.is_success() {
        (
            StatusCode::OK,
            Json(json!({"data": [{"url": "https://img.example/generated.png"}]})),
        )
    } else {
        (
            provider.image_status,
            Json(json!({"error": {"message": "image model overloaded"}})),
        )
    }
}

const GOOD_REPLY: &str = "```json\n{\"name\": \"Cinder Moth\", \"prompt\": \"a moth with glowing cinder wings\"}\n```";

fn llm_config(api_url: String, api_key: &str) -> LlmConfig {
    LlmConfig {
        api_url,
        api_key: api_key.to_owned(),
        model: String::from("test-chat"),
        image_model: String::from("test-image"),
        ..LlmConfig::default()
    }
}

fn only(rarity: Rarity) -> RarityWeights {
    let mut shares = [0; 8];
    shares[usize::from(rarity.rank())] = 1;
    RarityWeights::new(shares)
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn generates_entity_from_chat_and_image_calls() {
    let provider = Provider::new(GOOD_REPLY);
    let url = provider.spawn().await;
    let generator = LlmGenerator::new(llm_config(url, "sk-test"), only(Rarity::B)).unwrap();

    let entity = generator.generate_entity().await.unwrap();
    assert_eq!(entity.name, "Cinder Moth");
    assert_eq!(entity.prompt, "a moth with glowing cinder wings");
    assert_eq!(entity.image_url, "https://img.example/generated.png");
    assert_eq!(entity.rarity, Rarity::B);

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);

    let chat = &requests[0];
    assert_eq!(chat.path, "chat");
    assert_eq!(chat.authorization.as_deref(), Some("Bearer sk-test"));
    assert_eq!(chat.body["model"], "test-chat");
    let user = chat.body["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains("Rarity tier: B (Rare)"), "prompt was: {user}");

    let image = &requests[1];
    assert_eq!(image.path, "images");
    assert_eq!(image.body["model"], "test-image");
    assert_eq!(image.body["prompt"], "a moth with glowing cinder wings");
}

#[tokio::test]
async fn empty_api_key_sends_no_authorization() {
    let provider = Provider::new(GOOD_REPLY);
    let url = provider.spawn().await;
    let generator = LlmGenerator::new(llm_config(url, ""), RarityWeights::default()).unwrap();

    generator.generate_entity().await.unwrap();
    assert!(provider.requests().iter().all(|r| r.authorization.is_none()));
}

#[tokio::test]
async fn provider_error_status_is_reported() {
    let provider = Provider::new(GOOD_REPLY).with_image_status(StatusCode::SERVICE_UNAVAILABLE);
    let url = provider.spawn().await;
    let generator = LlmGenerator::new(llm_config(url, "k"), RarityWeights::default()).unwrap();

    let err = generator.generate_entity().await.unwrap_err();
    match err {
        GeneratorError::Provider(message) => {
            assert!(message.contains("503"), "message was: {message}");
            assert!(message.contains("overloaded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_reply_skips_the_image_call() {
    let provider = Provider::new("I could not think of anything.");
    let url = provider.spawn().await;
    let generator = LlmGenerator::new(llm_config(url, "k"), RarityWeights::default()).unwrap();

    let err = generator.generate_entity().await.unwrap_err();
    assert!(matches!(err, GeneratorError::Parse(_)));
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn unreachable_provider_is_a_provider_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let generator =
        LlmGenerator::new(llm_config(format!("http://{addr}/v1"), "k"), RarityWeights::default())
            .unwrap();
    let err = generator.generate_entity().await.unwrap_err();
    assert!(matches!(err, GeneratorError::Provider(_)));
}

#[tokio::test]
async fn provider_failure_is_refunded_by_the_controller() {
    let provider = Provider::new(GOOD_REPLY).with_image_status(StatusCode::INTERNAL_SERVER_ERROR);
    let url = provider.spawn().await;
    let config = GeneratorConfig {
        backend: BackendKind::Llm,
        llm: llm_config(url, "k"),
        ..GeneratorConfig::default()
    };
    let backend = GeneratorBackend::from_config(&config).unwrap();

    let dir = TempDir::new().unwrap();
    let db = Database::open_or_create(&SqliteConfig::for_path(&dir.path().join("t.db")))
        .await
        .unwrap();
    let controller = EconomyController::open(db, backend, EconomyConfig::default())
        .await
        .unwrap();

    let err = controller.generate().await.unwrap_err();
    match &err {
        EconomyError::GenerationFailed { message } => assert!(message.contains("500")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(controller.balance().await, 100);
    assert!(controller.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn provider_success_lands_in_the_collection() {
    let provider = Provider::new(GOOD_REPLY);
    let url = provider.spawn().await;
    let config = GeneratorConfig {
        backend: BackendKind::Llm,
        rarity_weights: only(Rarity::S),
        llm: llm_config(url, "k"),
        ..GeneratorConfig::default()
    };
    let backend = GeneratorBackend::from_config(&config).unwrap();

    let dir = TempDir::new().unwrap();
    let db = Database::open_or_create(&SqliteConfig::for_path(&dir.path().join("t.db")))
        .await
        .unwrap();
    let controller = EconomyController::open(db, backend, EconomyConfig::default())
        .await
        .unwrap();

    let entity = controller.generate().await.unwrap();
    assert_eq!(entity.rarity, Rarity::S);
    assert_eq!(controller.balance().await, 90);
    assert_eq!(controller.list().await.unwrap(), vec![entity]);
}
