use std::sync::Arc;

use stocktalk_core::domain::{ConversationTurn, Intent};
use stocktalk_core::errors::ChatError;
use stocktalk_core::prompts;

use crate::llm::LlmClient;

/// Labels one utterance with a single model call. Output that does not map
/// to a known label becomes [`Intent::Unclear`]; the orchestrator answers
/// with a clarification and never touches the database for that turn.
pub struct TaskClassifier {
    llm: Arc<dyn LlmClient>,
}

impl TaskClassifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn classify(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> Result<Intent, ChatError> {
        let prompt = prompts::classifier_prompt(message, history);
        let raw = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|error| ChatError::ExternalService(error.to_string()))?;

        Ok(Intent::from_model_label(&raw))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use stocktalk_core::domain::Intent;
    use stocktalk_core::errors::ChatError;

    use super::TaskClassifier;
    use crate::llm::ScriptedLlmClient;

    #[tokio::test]
    async fn maps_model_labels_to_intents() {
        let classifier =
            TaskClassifier::new(Arc::new(ScriptedLlmClient::new(["upsert", "  Query\n"])));
        assert_eq!(classifier.classify("add 5 monitors", &[]).await.expect("ok"), Intent::Upsert);
        assert_eq!(classifier.classify("show stock", &[]).await.expect("ok"), Intent::Query);
    }

    #[tokio::test]
    async fn unmapped_output_becomes_unclear() {
        let classifier = TaskClassifier::new(Arc::new(ScriptedLlmClient::new([
            "the user appears to want several things",
        ])));
        assert_eq!(classifier.classify("xyzzy", &[]).await.expect("ok"), Intent::Unclear);
    }

    #[tokio::test]
    async fn transport_failure_is_an_external_service_error() {
        let classifier = TaskClassifier::new(Arc::new(ScriptedLlmClient::default()));
        let error = classifier.classify("anything", &[]).await.unwrap_err();
        assert!(matches!(error, ChatError::ExternalService(_)));
    }
}
