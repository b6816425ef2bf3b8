pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repository;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{seed_demo_inventory, SeedResult};
pub use repository::{InventoryRepository, RepositoryError, SqlInventoryRepository};
