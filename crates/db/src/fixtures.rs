use crate::DbPool;

/// Deterministic demo rows loaded by `stocktalk seed`. Idempotent: rows
/// that already exist are left untouched.
const SEED_ITEMS: &[SeedItem] = &[
    SeedItem { item_name: "laptops", quantity: Some(20), description: Some("14-inch, dock included") },
    SeedItem { item_name: "monitors", quantity: Some(35), description: None },
    SeedItem { item_name: "keyboards", quantity: Some(50), description: Some("ANSI layout") },
    SeedItem { item_name: "hdmi cables", quantity: Some(12), description: None },
    SeedItem { item_name: "sample item", quantity: Some(1), description: Some("demo row, safe to delete") },
];

struct SeedItem {
    item_name: &'static str,
    quantity: Option<i64>,
    description: Option<&'static str>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub inserted: u64,
    pub skipped: u64,
}

pub async fn seed_demo_inventory(pool: &DbPool) -> Result<SeedResult, sqlx::Error> {
    let mut inserted = 0;
    let mut skipped = 0;

    for item in SEED_ITEMS {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO inventory (item_name, quantity, description, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(item.item_name)
        .bind(item.quantity)
        .bind(item.description)
        .bind(chrono::Utc::now())
        .execute(pool)
        .await?;

        if result.rows_affected() == 1 {
            inserted += 1;
        } else {
            skipped += 1;
        }
    }

    Ok(SeedResult { inserted, skipped })
}
