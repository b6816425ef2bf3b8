use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use stocktalk_agent::llm::LlmClient;
use stocktalk_agent::session::SessionOrchestrator;
use stocktalk_core::domain::{InventoryItem, ItemFilter};
use stocktalk_db::InventoryRepository;

type SessionMap = HashMap<String, Arc<Mutex<SessionOrchestrator>>>;

/// Shared handler state. The outer map lock is held only to fetch or insert
/// a session; each turn then runs under that session's own lock, so turns
/// within a session are serialized while separate sessions proceed
/// concurrently.
#[derive(Clone)]
pub struct ChatState {
    llm: Arc<dyn LlmClient>,
    repository: Arc<dyn InventoryRepository>,
    sessions: Arc<Mutex<SessionMap>>,
}

impl ChatState {
    pub fn new(llm: Arc<dyn LlmClient>, repository: Arc<dyn InventoryRepository>) -> Self {
        Self { llm, repository, sessions: Arc::new(Mutex::new(HashMap::new())) }
    }

    async fn session(&self, session_id: &str) -> Arc<Mutex<SessionOrchestrator>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(SessionOrchestrator::new(
                    session_id,
                    self.llm.clone(),
                    self.repository.clone(),
                )))
            })
            .clone()
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub session_id: String,
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub count: usize,
    pub items: Vec<InventoryItem>,
}

pub fn router(state: ChatState) -> Router {
    Router::new()
        .route("/sessions/{session_id}/messages", post(post_message))
        .route("/inventory", get(get_inventory))
        .with_state(state)
}

pub async fn post_message(
    State(state): State<ChatState>,
    Path(session_id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> (StatusCode, Json<MessageResponse>) {
    let text = request.text.trim().to_string();
    if text.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(MessageResponse {
                session_id,
                reply: "Message text must be non-empty.".to_string(),
            }),
        );
    }

    let message_id = Uuid::new_v4();
    info!(
        event_name = "server.chat.message_received",
        session_id = %session_id,
        message_id = %message_id,
        "processing chat message"
    );

    let session = state.session(&session_id).await;
    let reply = session.lock().await.handle_turn(&text).await;

    (StatusCode::OK, Json(MessageResponse { session_id, reply }))
}

pub async fn get_inventory(
    State(state): State<ChatState>,
) -> Result<Json<InventoryResponse>, StatusCode> {
    let items = state
        .repository
        .list(&ItemFilter::All)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(InventoryResponse { count: items.len(), items }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        Json,
    };

    use stocktalk_agent::llm::ScriptedLlmClient;
    use stocktalk_db::{connect_with_settings, migrations, SqlInventoryRepository};

    use crate::chat::{get_inventory, post_message, ChatState, MessageRequest};

    async fn state_with_script(
        responses: impl IntoIterator<Item = impl Into<String>>,
    ) -> ChatState {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 5)
            .await
            .expect("pool should connect");
        migrations::run_pending(&pool).await.expect("migrations should apply");

        ChatState::new(
            Arc::new(ScriptedLlmClient::new(responses)),
            Arc::new(SqlInventoryRepository::new(pool)),
        )
    }

    #[tokio::test]
    async fn post_message_runs_the_pipeline_and_replies() {
        let state = state_with_script([
            "upsert",
            r#"{"item_name": "laptops", "quantity": 20, "quantity_mode": "set"}"#,
        ])
        .await;

        let (status, Json(payload)) = post_message(
            State(state.clone()),
            Path("web-1".to_string()),
            Json(MessageRequest { text: "add 20 laptops".to_string() }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.session_id, "web-1");
        assert!(payload.reply.contains("laptops"), "unexpected reply: {}", payload.reply);

        let Json(inventory) = get_inventory(State(state)).await.expect("inventory should list");
        assert_eq!(inventory.count, 1);
        assert_eq!(inventory.items[0].item_name, "laptops");
        assert_eq!(inventory.items[0].quantity, Some(20));
    }

    #[tokio::test]
    async fn post_message_rejects_blank_text() {
        let state = state_with_script(Vec::<String>::new()).await;

        let (status, Json(payload)) = post_message(
            State(state),
            Path("web-1".to_string()),
            Json(MessageRequest { text: "   ".to_string() }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(payload.reply.contains("non-empty"));
    }

    #[tokio::test]
    async fn sessions_are_tracked_independently() {
        let state = state_with_script(["unknown", "unknown"]).await;

        let (status_a, Json(reply_a)) = post_message(
            State(state.clone()),
            Path("session-a".to_string()),
            Json(MessageRequest { text: "hello".to_string() }),
        )
        .await;
        let (status_b, Json(reply_b)) = post_message(
            State(state.clone()),
            Path("session-b".to_string()),
            Json(MessageRequest { text: "hello".to_string() }),
        )
        .await;

        assert_eq!(status_a, StatusCode::OK);
        assert_eq!(status_b, StatusCode::OK);
        assert_eq!(reply_a.reply, reply_b.reply);

        let sessions = state.sessions.lock().await;
        assert_eq!(sessions.len(), 2);
        let session_a = sessions.get("session-a").expect("session-a exists");
        assert_eq!(session_a.lock().await.history().len(), 2);
    }
}
