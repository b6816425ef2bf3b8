use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use thiserror::Error;

use stocktalk_core::domain::{
    DeleteTarget, InventoryItem, ItemChange, ItemFilter, QuantityChange,
};

use crate::DbPool;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The single-table contract the handlers program against: fetch (all or
/// filtered), insert-or-update keyed by item name, and delete by name or
/// filter. Each operation is one atomic statement, or one transaction for
/// the read-modify-write upsert.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn list(&self, filter: &ItemFilter) -> Result<Vec<InventoryItem>, RepositoryError>;

    async fn find(&self, item_name: &str) -> Result<Option<InventoryItem>, RepositoryError>;

    /// Insert when absent; otherwise overwrite only the fields the change
    /// carries. Returns the resulting row.
    async fn upsert(&self, change: ItemChange) -> Result<InventoryItem, RepositoryError>;

    /// Returns the number of rows removed. Zero matches is not an error.
    async fn delete(&self, target: &DeleteTarget) -> Result<u64, RepositoryError>;
}

pub struct SqlInventoryRepository {
    pool: DbPool,
}

impl SqlInventoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryRepository for SqlInventoryRepository {
    async fn list(&self, filter: &ItemFilter) -> Result<Vec<InventoryItem>, RepositoryError> {
        let rows = match filter {
            ItemFilter::All => {
                sqlx::query(
                    "SELECT item_name, quantity, description, created_at \
                     FROM inventory ORDER BY item_name",
                )
                .fetch_all(&self.pool)
                .await?
            }
            ItemFilter::NameContains(needle) => {
                sqlx::query(
                    "SELECT item_name, quantity, description, created_at FROM inventory \
                     WHERE instr(lower(item_name), lower(?1)) > 0 ORDER BY item_name",
                )
                .bind(needle)
                .fetch_all(&self.pool)
                .await?
            }
            ItemFilter::QuantityAtLeast(bound) => {
                sqlx::query(
                    "SELECT item_name, quantity, description, created_at FROM inventory \
                     WHERE quantity IS NOT NULL AND quantity >= ?1 ORDER BY item_name",
                )
                .bind(bound)
                .fetch_all(&self.pool)
                .await?
            }
            ItemFilter::QuantityBelow(bound) => {
                sqlx::query(
                    "SELECT item_name, quantity, description, created_at FROM inventory \
                     WHERE quantity IS NOT NULL AND quantity < ?1 ORDER BY item_name",
                )
                .bind(bound)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(row_to_item).collect()
    }

    async fn find(&self, item_name: &str) -> Result<Option<InventoryItem>, RepositoryError> {
        let row = sqlx::query(
            "SELECT item_name, quantity, description, created_at \
             FROM inventory WHERE item_name = ?1",
        )
        .bind(item_name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn upsert(&self, change: ItemChange) -> Result<InventoryItem, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query(
            "SELECT item_name, quantity, description, created_at \
             FROM inventory WHERE item_name = ?1",
        )
        .bind(&change.item_name)
        .fetch_optional(&mut *tx)
        .await?
        .as_ref()
        .map(row_to_item)
        .transpose()?;

        let item = match existing {
            Some(current) => {
                let quantity = apply_quantity_change(current.quantity, change.quantity);
                let description = change.description.or(current.description);

                sqlx::query(
                    "UPDATE inventory SET quantity = ?1, description = ?2 WHERE item_name = ?3",
                )
                .bind(quantity)
                .bind(&description)
                .bind(&current.item_name)
                .execute(&mut *tx)
                .await?;

                InventoryItem {
                    item_name: current.item_name,
                    quantity,
                    description,
                    created_at: current.created_at,
                }
            }
            None => {
                let quantity = apply_quantity_change(None, change.quantity);
                let created_at = Utc::now();

                sqlx::query(
                    "INSERT INTO inventory (item_name, quantity, description, created_at) \
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .bind(&change.item_name)
                .bind(quantity)
                .bind(&change.description)
                .bind(created_at)
                .execute(&mut *tx)
                .await?;

                InventoryItem {
                    item_name: change.item_name,
                    quantity,
                    description: change.description,
                    created_at,
                }
            }
        };

        tx.commit().await?;
        Ok(item)
    }

    async fn delete(&self, target: &DeleteTarget) -> Result<u64, RepositoryError> {
        let result = match target {
            DeleteTarget::Name(item_name) => {
                sqlx::query("DELETE FROM inventory WHERE item_name = ?1")
                    .bind(item_name)
                    .execute(&self.pool)
                    .await?
            }
            DeleteTarget::Filter(ItemFilter::All) => {
                sqlx::query("DELETE FROM inventory").execute(&self.pool).await?
            }
            DeleteTarget::Filter(ItemFilter::NameContains(needle)) => {
                sqlx::query(
                    "DELETE FROM inventory WHERE instr(lower(item_name), lower(?1)) > 0",
                )
                .bind(needle)
                .execute(&self.pool)
                .await?
            }
            DeleteTarget::Filter(ItemFilter::QuantityAtLeast(bound)) => {
                sqlx::query(
                    "DELETE FROM inventory WHERE quantity IS NOT NULL AND quantity >= ?1",
                )
                .bind(bound)
                .execute(&self.pool)
                .await?
            }
            DeleteTarget::Filter(ItemFilter::QuantityBelow(bound)) => {
                sqlx::query(
                    "DELETE FROM inventory WHERE quantity IS NOT NULL AND quantity < ?1",
                )
                .bind(bound)
                .execute(&self.pool)
                .await?
            }
        };

        Ok(result.rows_affected())
    }
}

/// `Set` overwrites, `Add` increments with NULL treated as zero, and no
/// change keeps the stored value.
fn apply_quantity_change(current: Option<i64>, change: Option<QuantityChange>) -> Option<i64> {
    match change {
        Some(QuantityChange::Set(value)) => Some(value),
        Some(QuantityChange::Add(delta)) => Some(current.unwrap_or(0).saturating_add(delta)),
        None => current,
    }
}

fn row_to_item(row: &SqliteRow) -> Result<InventoryItem, RepositoryError> {
    Ok(InventoryItem {
        item_name: row.try_get("item_name")?,
        quantity: row.try_get("quantity")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use stocktalk_core::domain::{
        DeleteTarget, ItemChange, ItemFilter, QuantityChange,
    };

    use super::{InventoryRepository, SqlInventoryRepository};
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlInventoryRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        SqlInventoryRepository::new(pool)
    }

    fn change(
        name: &str,
        quantity: Option<QuantityChange>,
        description: Option<&str>,
    ) -> ItemChange {
        ItemChange::new(name, quantity, description.map(str::to_string)).expect("valid change")
    }

    #[tokio::test]
    async fn upsert_inserts_then_lists_exactly_one_row() {
        let repo = repository().await;
        repo.upsert(change("laptops", Some(QuantityChange::Set(20)), None))
            .await
            .expect("insert");

        let rows = repo
            .list(&ItemFilter::NameContains("laptop".to_string()))
            .await
            .expect("list");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item_name, "laptops");
        assert_eq!(rows[0].quantity, Some(20));
        assert_eq!(rows[0].description, None);
    }

    #[tokio::test]
    async fn quantity_only_update_preserves_description() {
        let repo = repository().await;
        repo.upsert(change("rice", Some(QuantityChange::Set(50)), Some("premium quality")))
            .await
            .expect("insert");
        repo.upsert(change("rice", Some(QuantityChange::Set(30)), None))
            .await
            .expect("update quantity");

        let item = repo.find("rice").await.expect("find").expect("present");
        assert_eq!(item.quantity, Some(30));
        assert_eq!(item.description.as_deref(), Some("premium quality"));
    }

    #[tokio::test]
    async fn description_only_update_preserves_quantity() {
        let repo = repository().await;
        repo.upsert(change("rice", Some(QuantityChange::Set(50)), None)).await.expect("insert");
        repo.upsert(change("rice", None, Some("long grain"))).await.expect("update description");

        let item = repo.find("rice").await.expect("find").expect("present");
        assert_eq!(item.quantity, Some(50));
        assert_eq!(item.description.as_deref(), Some("long grain"));
    }

    #[tokio::test]
    async fn add_increments_and_treats_null_as_zero() {
        let repo = repository().await;
        repo.upsert(change("cables", None, Some("hdmi"))).await.expect("insert without quantity");
        let incremented = repo
            .upsert(change("cables", Some(QuantityChange::Add(5)), None))
            .await
            .expect("increment");
        assert_eq!(incremented.quantity, Some(5));

        let again = repo
            .upsert(change("cables", Some(QuantityChange::Add(3)), None))
            .await
            .expect("increment again");
        assert_eq!(again.quantity, Some(8));
    }

    #[tokio::test]
    async fn update_preserves_created_at() {
        let repo = repository().await;
        let inserted =
            repo.upsert(change("mice", Some(QuantityChange::Set(4)), None)).await.expect("insert");
        let updated = repo
            .upsert(change("mice", Some(QuantityChange::Set(9)), None))
            .await
            .expect("update");
        assert_eq!(inserted.created_at, updated.created_at);
    }

    #[tokio::test]
    async fn delete_missing_item_is_a_noop() {
        let repo = repository().await;
        repo.upsert(change("laptops", Some(QuantityChange::Set(20)), None))
            .await
            .expect("insert");

        let removed = repo
            .delete(&DeleteTarget::Name("old-keyboard".to_string()))
            .await
            .expect("delete");
        assert_eq!(removed, 0);

        let rows = repo.list(&ItemFilter::All).await.expect("list");
        assert_eq!(rows.len(), 1, "table unchanged after deleting a missing item");
    }

    #[tokio::test]
    async fn delete_by_filter_reports_match_count() {
        let repo = repository().await;
        for name in ["sample a", "sample b", "keepers"] {
            repo.upsert(change(name, Some(QuantityChange::Set(1)), None)).await.expect("insert");
        }

        let removed = repo
            .delete(&DeleteTarget::Filter(ItemFilter::NameContains("sample".to_string())))
            .await
            .expect("delete by filter");
        assert_eq!(removed, 2);

        let rows = repo.list(&ItemFilter::All).await.expect("list");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item_name, "keepers");
    }

    #[tokio::test]
    async fn quantity_filters_exclude_null_quantities() {
        let repo = repository().await;
        repo.upsert(change("stocked", Some(QuantityChange::Set(12)), None))
            .await
            .expect("insert");
        repo.upsert(change("unstocked", None, Some("no count yet"))).await.expect("insert");

        let low = repo.list(&ItemFilter::QuantityBelow(20)).await.expect("list below");
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].item_name, "stocked");

        let high = repo.list(&ItemFilter::QuantityAtLeast(1)).await.expect("list at least");
        assert_eq!(high.len(), 1);
    }
}
