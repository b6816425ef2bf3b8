use stocktalk_core::domain::ItemFilter;
use stocktalk_db::{
    connect_with_settings, migrations, seed_demo_inventory, InventoryRepository,
    SqlInventoryRepository,
};

async fn seeded_pool() -> stocktalk_db::DbPool {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrate");
    pool
}

#[tokio::test]
async fn seed_inserts_the_demo_dataset_once() {
    let pool = seeded_pool().await;

    let first = seed_demo_inventory(&pool).await.expect("first seed");
    assert_eq!(first.skipped, 0);
    assert!(first.inserted >= 5, "demo dataset should carry at least five rows");

    let second = seed_demo_inventory(&pool).await.expect("second seed");
    assert_eq!(second.inserted, 0, "reseeding must not duplicate rows");
    assert_eq!(second.skipped, first.inserted);
}

#[tokio::test]
async fn seeded_rows_are_visible_through_the_repository() {
    let pool = seeded_pool().await;
    seed_demo_inventory(&pool).await.expect("seed");

    let repo = SqlInventoryRepository::new(pool);
    let all = repo.list(&ItemFilter::All).await.expect("list all");
    assert!(all.iter().any(|item| item.item_name == "laptops"));

    let samples = repo
        .list(&ItemFilter::NameContains("sample".to_string()))
        .await
        .expect("list samples");
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].quantity, Some(1));
}
