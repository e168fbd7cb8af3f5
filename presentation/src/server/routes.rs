//! Router and handlers
//!
//! Serves:
//! - `GET  /`                                        health check
//! - `GET  /api/conversations`                       list metadata
//! - `POST /api/conversations`                       create a conversation
//! - `GET  /api/conversations/{id}`                  full conversation
//! - `POST /api/conversations/{id}/message`          run a turn, return the result
//! - `POST /api/conversations/{id}/message/stream`   run a turn as Server-Sent Events
//! - `GET  /api/models/config`                       council presets per mode

use super::error::ApiError;
use super::state::AppState;
use axum::extract::{Path, State};
use axum::response::sse::{self, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use council_application::{ModeConfig, ModelGateway, RunTurnInput, TurnOutcome};
use council_domain::{Conversation, ConversationMetadata, CouncilMode, Model, Question};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{debug, info};

/// Body of the message endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub custom_models: Option<Vec<Model>>,
    #[serde(default)]
    pub chairman_model: Option<Model>,
}

/// Response of `GET /api/models/config`
#[derive(Debug, Clone, Serialize)]
pub struct ModelsConfigResponse {
    pub default_mode: CouncilMode,
    pub modes: BTreeMap<&'static str, ModeConfig>,
}

/// Build the axum router for the council API
pub fn build_router<G: ModelGateway + 'static>(
    state: AppState<G>,
    allowed_origins: &[String],
) -> Router {
    let cors = if allowed_origins.is_empty() {
        CorsLayer::new()
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/", get(health_check))
        .route(
            "/api/conversations",
            get(list_conversations::<G>).post(create_conversation::<G>),
        )
        .route("/api/conversations/{id}", get(get_conversation::<G>))
        .route("/api/conversations/{id}/message", post(send_message::<G>))
        .route(
            "/api/conversations/{id}/message/stream",
            post(send_message_stream::<G>),
        )
        .route("/api/models/config", get(models_config::<G>))
        .layer(cors)
        .with_state(state)
}

/// Serve `router` on `addr` until `shutdown` is cancelled
pub async fn serve(
    router: Router,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("LLM Council API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Server stopped");
    Ok(())
}

/// GET / - health check
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "LLM Council API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_conversations<G: ModelGateway + 'static>(
    State(state): State<AppState<G>>,
) -> Result<Json<Vec<ConversationMetadata>>, ApiError> {
    Ok(Json(state.store.list().await?))
}

async fn create_conversation<G: ModelGateway + 'static>(
    State(state): State<AppState<G>>,
) -> Result<Json<Conversation>, ApiError> {
    let id = uuid::Uuid::new_v4().to_string();
    let conversation = state.store.create(&id).await?;
    debug!("Created conversation {}", id);
    Ok(Json(conversation))
}

async fn get_conversation<G: ModelGateway + 'static>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> Result<Json<Conversation>, ApiError> {
    state
        .store
        .get(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// Check the conversation exists and turn the request body into a turn input
async fn prepare_turn<G: ModelGateway + 'static>(
    state: &AppState<G>,
    id: &str,
    request: SendMessageRequest,
) -> Result<RunTurnInput, ApiError> {
    if state.store.get(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    let mode = request
        .mode
        .as_deref()
        .map(CouncilMode::from_name)
        .unwrap_or_else(|| state.turns.config().default_mode());

    let mut input = RunTurnInput::new(Question::new(request.content)?, mode).in_conversation(id);
    if let Some(models) = request.custom_models {
        input = input.with_models(models);
    }
    if let Some(chairman) = request.chairman_model {
        input = input.with_chairman(chairman);
    }
    Ok(input)
}

/// POST /api/conversations/{id}/message - run a turn and return its result
async fn send_message<G: ModelGateway + 'static>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<TurnOutcome>, ApiError> {
    let input = prepare_turn(&state, &id, request).await?;
    let mut outcome = state.turns.run_to_completion(input).await?;
    // The title reaches clients through the conversation itself
    outcome.title = None;
    Ok(Json(outcome))
}

/// POST /api/conversations/{id}/message/stream - run a turn as SSE
///
/// One `data:` frame per council event. A client disconnect drops the
/// stream, which cancels the turn.
async fn send_message_stream<G: ModelGateway + 'static>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Response, ApiError> {
    let input = prepare_turn(&state, &id, request).await?;
    debug!("Streaming turn for conversation {}", id);

    let events = state
        .turns
        .start(input)
        .map(|event| sse::Event::default().json_data(&event));

    Ok(Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response())
}

/// GET /api/models/config - council presets
async fn models_config<G: ModelGateway + 'static>(
    State(state): State<AppState<G>>,
) -> Json<ModelsConfigResponse> {
    let config = state.turns.config();
    let modes = CouncilMode::ALL
        .into_iter()
        .map(|mode| (mode.as_str(), config.mode_config(mode)))
        .collect();
    Json(ModelsConfigResponse {
        default_mode: config.default_mode(),
        modes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use council_application::{
        ConversationStore, CouncilConfigPort, GatewayError, RunTurnUseCase, StoreError,
    };
    use council_domain::{ChatMessage, FINAL_RANKING_MARKER, Message};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    struct EchoGateway;

    #[async_trait]
    impl ModelGateway for EchoGateway {
        async fn invoke(
            &self,
            model: &Model,
            messages: &[ChatMessage],
        ) -> Result<String, GatewayError> {
            let prompt = messages
                .last()
                .map(|m| m.content.as_str())
                .unwrap_or_default();
            let reply = if prompt.contains("Generate a very short title") {
                "Test Title".to_string()
            } else if prompt.contains("STAGE 1 - Individual Responses") {
                "Final synthesized answer".to_string()
            } else if prompt.contains(FINAL_RANKING_MARKER) {
                format!("{}\n1. Response A\n2. Response B", FINAL_RANKING_MARKER)
            } else {
                format!("answer from {}", model)
            };
            Ok(reply)
        }
    }

    struct TwoModels;

    impl CouncilConfigPort for TwoModels {
        fn mode_config(&self, _mode: CouncilMode) -> ModeConfig {
            ModeConfig::new(vec![Model::Gpt51, Model::Grok4], Model::Gemini3Pro)
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        conversations: Mutex<HashMap<String, Conversation>>,
    }

    #[async_trait]
    impl ConversationStore for MemoryStore {
        async fn create(&self, id: &str) -> Result<Conversation, StoreError> {
            let conversation = Conversation::new(id);
            self.conversations
                .lock()
                .unwrap()
                .insert(id.to_string(), conversation.clone());
            Ok(conversation)
        }

        async fn get(&self, id: &str) -> Result<Option<Conversation>, StoreError> {
            Ok(self.conversations.lock().unwrap().get(id).cloned())
        }

        async fn list(&self) -> Result<Vec<ConversationMetadata>, StoreError> {
            Ok(self
                .conversations
                .lock()
                .unwrap()
                .values()
                .map(Conversation::metadata)
                .collect())
        }

        async fn append_message(&self, id: &str, message: Message) -> Result<(), StoreError> {
            let mut conversations = self.conversations.lock().unwrap();
            let conversation = conversations
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            conversation.messages.push(message);
            Ok(())
        }

        async fn update_title(&self, id: &str, title: &str) -> Result<(), StoreError> {
            let mut conversations = self.conversations.lock().unwrap();
            let conversation = conversations
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            conversation.title = title.to_string();
            Ok(())
        }
    }

    fn test_app() -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let turns = RunTurnUseCase::new(Arc::new(EchoGateway), Arc::new(TwoModels))
            .with_store(store.clone())
            .with_seed(7);
        let state = AppState::new(Arc::new(turns), store.clone());
        (build_router(state, &[]), store)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _) = test_app();
        let req = Request::builder().uri("/").body(Body::empty()).expect("request");

        let resp = app.oneshot(req).await.expect("response");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_and_get_conversation() {
        let (app, _) = test_app();

        let resp = app
            .clone()
            .oneshot(post_json("/api/conversations", serde_json::json!({})))
            .await
            .expect("response");
        assert_eq!(resp.status(), StatusCode::OK);
        let created = body_json(resp).await;
        let id = created["id"].as_str().expect("id").to_string();
        assert_eq!(created["title"], "New Conversation");

        let req = Request::builder()
            .uri(format!("/api/conversations/{}", id))
            .body(Body::empty())
            .expect("request");
        let resp = app.clone().oneshot(req).await.expect("response");
        assert_eq!(resp.status(), StatusCode::OK);

        let req = Request::builder()
            .uri("/api/conversations")
            .body(Body::empty())
            .expect("request");
        let list = body_json(app.oneshot(req).await.expect("response")).await;
        assert_eq!(list.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_unknown_conversation_is_404() {
        let (app, _) = test_app();
        let req = Request::builder()
            .uri("/api/conversations/nope")
            .body(Body::empty())
            .expect("request");

        let resp = app.clone().oneshot(req).await.expect("response");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["detail"], "Conversation not found");

        let resp = app
            .oneshot(post_json(
                "/api/conversations/nope/message",
                serde_json::json!({"content": "Hi"}),
            ))
            .await
            .expect("response");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_send_message_returns_all_stages() {
        let (app, store) = test_app();
        store.create("conv-1").await.unwrap();

        let resp = app
            .oneshot(post_json(
                "/api/conversations/conv-1/message",
                serde_json::json!({"content": "What is Rust?", "mode": "chat"}),
            ))
            .await
            .expect("response");
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["stage1"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["stage2"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["stage3"]["response"], "Final synthesized answer");
        assert_eq!(body["metadata"]["aggregate_rankings"].as_array().map(Vec::len), Some(2));
        assert!(body.get("title").is_none());

        let stored = store.get("conv-1").await.unwrap().unwrap();
        assert_eq!(stored.messages.len(), 2);
        assert_eq!(stored.title, "Test Title");
    }

    #[tokio::test]
    async fn test_empty_content_is_bad_request() {
        let (app, store) = test_app();
        store.create("conv-1").await.unwrap();

        let resp = app
            .oneshot(post_json(
                "/api/conversations/conv-1/message",
                serde_json::json!({"content": "   "}),
            ))
            .await
            .expect("response");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stream_emits_ordered_events() {
        let (app, store) = test_app();
        store.create("conv-1").await.unwrap();

        let resp = app
            .oneshot(post_json(
                "/api/conversations/conv-1/message/stream",
                serde_json::json!({
                    "content": "What is Rust?",
                    "custom_models": ["openai/gpt-5.1", "x-ai/grok-4"]
                }),
            ))
            .await
            .expect("response");
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("body");
        let text = String::from_utf8_lossy(&bytes);
        let types: Vec<String> = text
            .lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .filter_map(|data| serde_json::from_str::<serde_json::Value>(data).ok())
            .filter_map(|event| event["type"].as_str().map(str::to_string))
            .collect();

        assert_eq!(
            types,
            vec![
                "stage1_start",
                "stage1_complete",
                "stage2_start",
                "stage2_complete",
                "stage3_start",
                "stage3_complete",
                "title_complete",
                "complete",
            ]
        );
    }

    #[tokio::test]
    async fn test_models_config() {
        let (app, _) = test_app();
        let req = Request::builder()
            .uri("/api/models/config")
            .body(Body::empty())
            .expect("request");

        let body = body_json(app.oneshot(req).await.expect("response")).await;
        assert_eq!(body["default_mode"], "chat");
        assert_eq!(body["modes"]["code"]["chairman_model"], "google/gemini-3-pro-preview");
        assert_eq!(
            body["modes"]["chat"]["council_models"],
            serde_json::json!(["openai/gpt-5.1", "x-ai/grok-4"])
        );
    }
}
