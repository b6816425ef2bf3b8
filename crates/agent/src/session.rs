use std::sync::Arc;

use tracing::{info, warn};

use stocktalk_core::domain::{ConversationHistory, ConversationTurn, Intent};
use stocktalk_core::errors::ChatError;

use stocktalk_db::InventoryRepository;

use crate::classifier::TaskClassifier;
use crate::handlers::IntentHandlers;
use crate::llm::LlmClient;

/// One conversation: the bounded history plus the classify-and-dispatch
/// pipeline. Sessions share the repository and the model client through
/// `Arc` but never share history; create one orchestrator per session
/// identifier.
pub struct SessionOrchestrator {
    session_id: String,
    classifier: TaskClassifier,
    handlers: IntentHandlers,
    history: ConversationHistory,
}

impl SessionOrchestrator {
    pub fn new(
        session_id: impl Into<String>,
        llm: Arc<dyn LlmClient>,
        repository: Arc<dyn InventoryRepository>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            classifier: TaskClassifier::new(llm.clone()),
            handlers: IntentHandlers::new(llm, repository),
            history: ConversationHistory::new(),
        }
    }

    /// Process one user turn and return the reply. Failures are mapped to
    /// their user-facing reply here; the exchange is appended to history
    /// either way, so a failed turn still provides context for the next.
    pub async fn handle_turn(&mut self, text: &str) -> String {
        let reply = match self.process(text).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(
                    event_name = "agent.turn.failed",
                    session_id = %self.session_id,
                    error = %error,
                    "turn failed; replying with user-safe message"
                );
                error.user_reply()
            }
        };

        self.history.push(ConversationTurn::user(text));
        self.history.push(ConversationTurn::agent(reply.clone()));
        reply
    }

    async fn process(&self, text: &str) -> Result<String, ChatError> {
        // Prompts see the history up to but not including this turn; the
        // utterance itself is embedded separately by each template.
        let history = self.history.turns();
        let intent = self.classifier.classify(text, history).await?;

        info!(
            event_name = "agent.turn.classified",
            session_id = %self.session_id,
            intent = %intent,
            "utterance classified"
        );

        match intent {
            Intent::Query => self.handlers.query(text, history).await,
            Intent::Upsert => self.handlers.upsert(text, history).await,
            Intent::Delete => self.handlers.delete(text, history).await,
            Intent::Unclear => Err(ChatError::Classification),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn history(&self) -> &[ConversationTurn] {
        self.history.turns()
    }
}
