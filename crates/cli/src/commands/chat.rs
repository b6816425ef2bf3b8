use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use stocktalk_agent::llm::HttpLlmClient;
use stocktalk_agent::session::SessionOrchestrator;
use stocktalk_core::config::{AppConfig, LoadOptions};
use stocktalk_core::domain::{InventoryItem, ItemFilter};
use stocktalk_db::{connect, migrations, InventoryRepository, SqlInventoryRepository};

const HELP_TEXT: &str = "\
Commands:
  - Type a question or instruction about the inventory, e.g.
      \"How many laptops do we have?\"
      \"Add 5 new monitors to the inventory\"
      \"Delete HDMI cables from inventory\"
  - 'help' shows this message
  - 'exit', 'quit', or 'q' leaves the chat";

pub fn run() -> ExitCode {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("configuration issue: {error}");
            return ExitCode::from(2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("failed to initialize async runtime: {error}");
            return ExitCode::from(3);
        }
    };

    match runtime.block_on(chat_loop(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::from(4)
        }
    }
}

async fn chat_loop(config: AppConfig) -> Result<(), String> {
    let pool = connect(&config.database)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    migrations::run_pending(&pool)
        .await
        .map_err(|error| format!("failed to run migrations: {error}"))?;

    let repository = Arc::new(SqlInventoryRepository::new(pool));
    let llm = Arc::new(
        HttpLlmClient::from_config(&config.llm)
            .map_err(|error| format!("failed to build model client: {error}"))?,
    );
    let mut session = SessionOrchestrator::new("cli", llm, repository.clone());

    println!("Stocktalk inventory assistant. Ask about, add, update, or delete items.");
    println!("{HELP_TEXT}\n");

    let stdin = io::stdin();
    loop {
        print_inventory(repository.as_ref()).await;

        print!("\n> ");
        io::stdout().flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(error) => return Err(format!("failed to read input: {error}")),
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_ascii_lowercase().as_str(), "exit" | "quit" | "q") {
            println!("Goodbye!");
            break;
        }
        if input.eq_ignore_ascii_case("help") {
            println!("{HELP_TEXT}");
            continue;
        }

        println!("Processing...");
        let reply = session.handle_turn(input).await;
        println!("{reply}");
    }

    Ok(())
}

async fn print_inventory(repository: &SqlInventoryRepository) {
    match repository.list(&ItemFilter::All).await {
        Ok(items) if items.is_empty() => println!("\nInventory is empty."),
        Ok(items) => {
            println!("\nCurrent Inventory ({} items):", items.len());
            println!("{:-<70}", "");
            println!("{:<24} {:>8}  {:<34}", "Item Name", "Quantity", "Description");
            println!("{:-<70}", "");
            for item in &items {
                println!("{}", render_row(item));
            }
            println!("{:-<70}", "");
        }
        Err(error) => println!("\nCould not load inventory: {error}"),
    }
}

fn render_row(item: &InventoryItem) -> String {
    let quantity = item.quantity.map(|q| q.to_string()).unwrap_or_else(|| "-".to_string());
    let description = item.description.as_deref().unwrap_or("");
    format!("{:<24} {:>8}  {:<34}", item.item_name, quantity, description)
}

#[cfg(test)]
mod tests {
    use stocktalk_core::domain::InventoryItem;

    use super::render_row;

    #[test]
    fn row_renders_missing_quantity_as_dash() {
        let item = InventoryItem::new("monitors", None, None).expect("valid item");
        let row = render_row(&item);
        assert!(row.contains("monitors"));
        assert!(row.contains('-'));
    }

    #[test]
    fn row_renders_quantity_and_description() {
        let item = InventoryItem::new("laptops", Some(20), Some("docked".to_string()))
            .expect("valid item");
        let row = render_row(&item);
        assert!(row.contains("20"));
        assert!(row.contains("docked"));
    }
}
