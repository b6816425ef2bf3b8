use std::sync::Arc;

use stocktalk_core::domain::{ConversationTurn, DeleteTarget, ItemFilter};
use stocktalk_core::errors::ChatError;
use stocktalk_core::prompts;

use stocktalk_db::{InventoryRepository, RepositoryError};

use crate::extract::{parse_extraction, parse_filter, DeleteExtraction, UpsertExtraction};
use crate::llm::{LlmClient, LlmError};

/// The three intent handlers behind the classifier. Each one makes the
/// model calls for its intent, validates the extraction, and runs exactly
/// one repository operation.
pub struct IntentHandlers {
    llm: Arc<dyn LlmClient>,
    repository: Arc<dyn InventoryRepository>,
}

impl IntentHandlers {
    pub fn new(llm: Arc<dyn LlmClient>, repository: Arc<dyn InventoryRepository>) -> Self {
        Self { llm, repository }
    }

    /// Query: extract a row filter, fetch the matching rows, then let the
    /// model answer grounded in them. Zero matches short-circuits to a
    /// deterministic reply with no second model call.
    pub async fn query(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> Result<String, ChatError> {
        let snapshot = self.repository.list(&ItemFilter::All).await.map_err(external)?;

        let filter_output = self
            .llm
            .complete(&prompts::query_filter_prompt(message, &snapshot, history))
            .await
            .map_err(external_llm)?;
        let filter = parse_filter(&filter_output)?;

        let matched = self.repository.list(&filter).await.map_err(external)?;
        if matched.is_empty() {
            return Ok("No items found.".to_string());
        }

        let answer = self
            .llm
            .complete(&prompts::query_answer_prompt(message, &matched, history))
            .await
            .map_err(external_llm)?;

        Ok(answer.trim().to_string())
    }

    /// Upsert: extract `{item_name, quantity, quantity_mode, description}`
    /// and apply one insert-or-update keyed by item name.
    pub async fn upsert(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> Result<String, ChatError> {
        let snapshot = self.repository.list(&ItemFilter::All).await.map_err(external)?;

        let output = self
            .llm
            .complete(&prompts::upsert_prompt(message, &snapshot, history))
            .await
            .map_err(external_llm)?;
        let change = parse_extraction::<UpsertExtraction>(&output)?.into_change()?;

        let item = self.repository.upsert(change).await.map_err(external)?;

        let reply = match item.quantity {
            Some(quantity) => {
                format!("Done: \"{}\" now has quantity {}.", item.item_name, quantity)
            }
            None => format!("Done: \"{}\" recorded (no quantity set).", item.item_name),
        };
        Ok(reply)
    }

    /// Delete: extract the target (exact name or name filter) and remove
    /// the matching rows. Zero matches is an informational reply; there is
    /// no confirmation round before deletion.
    pub async fn delete(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> Result<String, ChatError> {
        let snapshot = self.repository.list(&ItemFilter::All).await.map_err(external)?;

        let output = self
            .llm
            .complete(&prompts::delete_prompt(message, &snapshot, history))
            .await
            .map_err(external_llm)?;
        let target = parse_extraction::<DeleteExtraction>(&output)?.into_target()?;

        let removed = self.repository.delete(&target).await.map_err(external)?;

        let reply = match (&target, removed) {
            (DeleteTarget::Name(name), 0) => {
                format!("Item \"{name}\" was not found in the inventory.")
            }
            (_, 0) => "No matching items were found in the inventory.".to_string(),
            (DeleteTarget::Name(name), _) => {
                format!("Deleted \"{name}\" from the inventory.")
            }
            (DeleteTarget::Filter(_), count) => {
                format!("Deleted {count} matching item(s) from the inventory.")
            }
        };
        Ok(reply)
    }
}

fn external(error: RepositoryError) -> ChatError {
    ChatError::ExternalService(error.to_string())
}

fn external_llm(error: LlmError) -> ChatError {
    ChatError::ExternalService(error.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use stocktalk_core::domain::{ItemChange, ItemFilter, QuantityChange};
    use stocktalk_core::errors::ChatError;
    use stocktalk_db::{
        connect_with_settings, migrations, InventoryRepository, SqlInventoryRepository,
    };

    use super::IntentHandlers;
    use crate::llm::ScriptedLlmClient;

    async fn repository() -> Arc<SqlInventoryRepository> {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        Arc::new(SqlInventoryRepository::new(pool))
    }

    fn handlers(
        repository: Arc<SqlInventoryRepository>,
        responses: &[&str],
    ) -> IntentHandlers {
        IntentHandlers::new(
            Arc::new(ScriptedLlmClient::new(responses.iter().copied())),
            repository,
        )
    }

    #[tokio::test]
    async fn upsert_creates_row_from_extraction() {
        let repo = repository().await;
        let handlers = handlers(
            repo.clone(),
            &[r#"{"item_name": "laptops", "quantity": 20, "quantity_mode": "set"}"#],
        );

        let reply = handlers.upsert("Add 20 laptops to the inventory", &[]).await.expect("reply");
        assert!(reply.contains("laptops"));
        assert!(reply.contains("20"));

        let item = repo.find("laptops").await.expect("find").expect("present");
        assert_eq!(item.quantity, Some(20));
        assert_eq!(item.description, None);
    }

    #[tokio::test]
    async fn upsert_extraction_failure_makes_no_database_call() {
        let repo = repository().await;
        let handlers = handlers(repo.clone(), &["I am not sure which item you mean."]);

        let error = handlers.upsert("add some of those", &[]).await.unwrap_err();
        assert!(matches!(error, ChatError::Extraction(_)));

        let rows = repo.list(&ItemFilter::All).await.expect("list");
        assert!(rows.is_empty(), "no row may be written on extraction failure");
    }

    #[tokio::test]
    async fn query_answers_grounded_in_matched_rows() {
        let repo = repository().await;
        repo.upsert(
            ItemChange::new("laptops", Some(QuantityChange::Set(20)), None).expect("change"),
        )
        .await
        .expect("seed row");

        let handlers = handlers(
            repo,
            &[
                r#"{"kind": "name_contains", "value": "laptop"}"#,
                "We currently have 20 laptops in stock.",
            ],
        );

        let reply = handlers.query("How many laptops do we have?", &[]).await.expect("reply");
        assert!(reply.contains("20"));
    }

    #[tokio::test]
    async fn query_with_no_matches_short_circuits() {
        let repo = repository().await;
        // Only the filter extraction is scripted; a second model call would
        // exhaust the script and fail the test.
        let handlers = handlers(repo, &[r#"{"kind": "name_contains", "value": "printer"}"#]);

        let reply = handlers.query("Do we have printers?", &[]).await.expect("reply");
        assert_eq!(reply, "No items found.");
    }

    #[tokio::test]
    async fn delete_missing_item_reports_not_found() {
        let repo = repository().await;
        repo.upsert(ItemChange::new("laptops", Some(QuantityChange::Set(20)), None).expect("ok"))
            .await
            .expect("seed row");

        let handlers = handlers(repo.clone(), &[r#"{"item_name": "old-keyboard"}"#]);
        let reply =
            handlers.delete("Delete the item called 'old-keyboard'", &[]).await.expect("reply");
        assert!(reply.contains("not found"));

        let rows = repo.list(&ItemFilter::All).await.expect("list");
        assert_eq!(rows.len(), 1, "row count unchanged");
    }

    #[tokio::test]
    async fn delete_by_filter_reports_count() {
        let repo = repository().await;
        for name in ["sample a", "sample b", "laptops"] {
            repo.upsert(ItemChange::new(name, Some(QuantityChange::Set(1)), None).expect("ok"))
                .await
                .expect("seed row");
        }

        let handlers = handlers(repo.clone(), &[r#"{"name_contains": "sample"}"#]);
        let reply = handlers.delete("Remove all sample items", &[]).await.expect("reply");
        assert!(reply.contains("Deleted 2"));
    }
}
