//! Prompt builders for the classifier and the three intent handlers.
//!
//! Every prompt embeds the user utterance, the formatted current inventory
//! snapshot, and the formatted recent conversation (at most
//! [`HISTORY_WINDOW`](crate::domain::HISTORY_WINDOW) turns). The extraction
//! prompts instruct the model to emit a single JSON object and nothing
//! else; the handlers treat anything that does not parse as an extraction
//! failure.

use crate::domain::{ConversationTurn, InventoryItem, Role};

/// Render the recent conversation for inclusion in a prompt, numbered
/// oldest-first. An empty history renders a fixed placeholder line so the
/// template shape stays stable.
pub fn format_history(turns: &[ConversationTurn]) -> String {
    if turns.is_empty() {
        return "No previous conversation history.".to_string();
    }

    let mut out = String::from("Previous conversation history:\n");
    for (index, turn) in turns.iter().enumerate() {
        let speaker = match turn.role {
            Role::User => "User",
            Role::Agent => "Assistant",
        };
        out.push_str(&format!("{}. {speaker}: {}\n", index + 1, turn.text));
    }
    out
}

/// Render the inventory snapshot as a pipe-separated table.
pub fn format_inventory_table(items: &[InventoryItem]) -> String {
    if items.is_empty() {
        return "The inventory is empty.".to_string();
    }

    let mut out = String::from("INVENTORY DATA:\n| Item Name | Quantity | Description |\n");
    for item in items {
        let quantity =
            item.quantity.map(|q| q.to_string()).unwrap_or_else(|| "N/A".to_string());
        let description = item.description.as_deref().unwrap_or("");
        out.push_str(&format!("| {} | {} | {} |\n", item.item_name, quantity, description));
    }
    out
}

/// Classifier prompt. Constrains the model to exactly one of the four
/// labels; the caller maps anything else to `unclear`.
pub fn classifier_prompt(message: &str, history: &[ConversationTurn]) -> String {
    let chat_context = format_history(history);
    format!(
        "You are a task classifier for an inventory management system.\n\
         Analyze the user's message and decide which operation they want.\n\n\
         Respond with exactly one word, one of:\n\
         query - the user wants to retrieve or ask about inventory items\n\
         upsert - the user wants to add new items or update existing items\n\
         delete - the user wants to remove items from the inventory\n\
         unclear - the message does not fit any of the above\n\n\
         Example classifications:\n\
         - \"Show me all laptops in stock\" -> query\n\
         - \"How many keyboards do we have?\" -> query\n\
         - \"Add 5 new monitors to inventory\" -> upsert\n\
         - \"Update the quantity of mice to 20\" -> upsert\n\
         - \"Remove all HDMI cables from inventory\" -> delete\n\n\
         Use the conversation history only to resolve references like \"them\".\n\n\
         {chat_context}\n\
         Now classify this message: {message}\n"
    )
}

/// Filter-extraction prompt for the query handler.
pub fn query_filter_prompt(
    message: &str,
    inventory: &[InventoryItem],
    history: &[ConversationTurn],
) -> String {
    let chat_context = format_history(history);
    let inventory_table = format_inventory_table(inventory);
    format!(
        "You are an inventory query agent.\n\
         Translate the user's question into a row filter over the inventory table.\n\n\
         Use the conversation history to resolve ambiguous references. For example,\n\
         if the user previously asked about laptops and now asks \"how many do we\n\
         have?\", the filter should target laptops.\n\n\
         {chat_context}\n\
         Here is the current inventory data:\n\n\
         {inventory_table}\n\
         Always respond with a valid JSON object containing only these keys:\n\n\
         kind -> one of \"all\", \"name_contains\", \"quantity_at_least\", \"quantity_below\"\n\
         value -> string for name_contains, integer for the quantity kinds, omit for all\n\n\
         Examples:\n\
         \"Show me everything\" -> {{\"kind\": \"all\"}}\n\
         \"How many laptops do we have?\" -> {{\"kind\": \"name_contains\", \"value\": \"laptop\"}}\n\
         \"Which items are running low, under 10?\" -> {{\"kind\": \"quantity_below\", \"value\": 10}}\n\n\
         {message}\n"
    )
}

/// Answer prompt for the query handler, grounded in the rows the filter
/// matched. The model must not invent values that are not in the table.
pub fn query_answer_prompt(
    message: &str,
    matched: &[InventoryItem],
    history: &[ConversationTurn],
) -> String {
    let chat_context = format_history(history);
    let inventory_table = format_inventory_table(matched);
    format!(
        "You are an Inventory Management Assistant.\n\
         Your only knowledge source is the inventory data provided below.\n\
         Answer the user's question based strictly on this data.\n\
         If the question asks for something not present in the data, say you\n\
         don't have that information. Do not invent values.\n\
         Provide a clear, concise answer mentioning counts and quantities.\n\n\
         {chat_context}\n\
         Here is the matching inventory data ({count} items):\n\n\
         {inventory_table}\n\
         User query: {message}\n",
        count = matched.len(),
    )
}

/// Extraction prompt for the upsert handler.
pub fn upsert_prompt(
    message: &str,
    inventory: &[InventoryItem],
    history: &[ConversationTurn],
) -> String {
    let chat_context = format_history(history);
    let inventory_table = format_inventory_table(inventory);
    format!(
        "You are an inventory upsert agent.\n\
         Extract structured information from the user's request to add a new item\n\
         or update an existing item. The table is keyed by item_name; match the\n\
         casing of existing items when the user refers to one.\n\n\
         Use the conversation history to resolve ambiguous references. For example,\n\
         if the user previously asked about laptops and now says \"add 5 more\",\n\
         they mean laptops.\n\n\
         {chat_context}\n\
         Here is the current inventory data:\n\n\
         {inventory_table}\n\
         Always respond with a valid JSON object containing only these keys:\n\n\
         item_name -> string (required)\n\
         quantity -> integer or null (null only when the request changes the description alone)\n\
         quantity_mode -> \"set\" or \"add\"; use \"add\" only when the user clearly asks for\n\
         an increment (\"add 5 more\", \"we received another 10\"); when in doubt use \"set\"\n\
         description -> string or null\n\n\
         Examples:\n\
         \"Add 20 laptops to the inventory.\"\n\
         {{\"item_name\": \"laptops\", \"quantity\": 20, \"quantity_mode\": \"set\", \"description\": null}}\n\
         \"We received 5 more monitors.\"\n\
         {{\"item_name\": \"monitors\", \"quantity\": 5, \"quantity_mode\": \"add\", \"description\": null}}\n\
         \"Update the rice quantity to 50 and add note premium quality.\"\n\
         {{\"item_name\": \"rice\", \"quantity\": 50, \"quantity_mode\": \"set\", \"description\": \"premium quality\"}}\n\n\
         {message}\n"
    )
}

/// Extraction prompt for the delete handler.
pub fn delete_prompt(
    message: &str,
    inventory: &[InventoryItem],
    history: &[ConversationTurn],
) -> String {
    let chat_context = format_history(history);
    let inventory_table = format_inventory_table(inventory);
    format!(
        "You are an inventory delete agent.\n\
         Identify what should be deleted from the inventory based on the user's\n\
         request. Match the casing of existing items.\n\n\
         Use the conversation history to resolve ambiguous references. For example,\n\
         if the user previously asked about laptops and now says \"delete them\",\n\
         they mean laptops.\n\n\
         {chat_context}\n\
         Here is the current inventory data:\n\n\
         {inventory_table}\n\
         Always respond with a valid JSON object containing exactly one of these keys:\n\n\
         item_name -> string, when one specific item should be removed\n\
         name_contains -> string, when every item whose name contains the value should be removed\n\n\
         Examples:\n\
         \"Delete rice from the stock list.\" -> {{\"item_name\": \"rice\"}}\n\
         \"Remove all sample items.\" -> {{\"name_contains\": \"sample\"}}\n\n\
         {message}\n"
    )
}

#[cfg(test)]
mod tests {
    use crate::domain::{ConversationTurn, InventoryItem};

    use super::{
        classifier_prompt, delete_prompt, format_history, format_inventory_table, upsert_prompt,
    };

    fn sample_items() -> Vec<InventoryItem> {
        vec![
            InventoryItem::new("laptops", Some(20), None).expect("valid"),
            InventoryItem::new("rice", Some(50), Some("premium quality".to_string()))
                .expect("valid"),
        ]
    }

    #[test]
    fn empty_history_renders_placeholder() {
        assert_eq!(format_history(&[]), "No previous conversation history.");
    }

    #[test]
    fn history_is_numbered_oldest_first() {
        let turns = vec![
            ConversationTurn::user("how many laptops?"),
            ConversationTurn::agent("We have 20 laptops."),
        ];
        let rendered = format_history(&turns);
        assert!(rendered.starts_with("Previous conversation history:"));
        assert!(rendered.contains("1. User: how many laptops?"));
        assert!(rendered.contains("2. Assistant: We have 20 laptops."));
    }

    #[test]
    fn empty_inventory_renders_placeholder() {
        assert_eq!(format_inventory_table(&[]), "The inventory is empty.");
    }

    #[test]
    fn inventory_table_includes_all_rows() {
        let rendered = format_inventory_table(&sample_items());
        assert!(rendered.contains("| laptops | 20 |"));
        assert!(rendered.contains("| rice | 50 | premium quality |"));
    }

    #[test]
    fn classifier_prompt_embeds_message_and_labels() {
        let prompt = classifier_prompt("add 5 monitors", &[]);
        assert!(prompt.contains("Now classify this message: add 5 monitors"));
        for label in ["query", "upsert", "delete", "unclear"] {
            assert!(prompt.contains(label), "missing label {label}");
        }
    }

    #[test]
    fn extraction_prompts_embed_inventory_and_utterance() {
        let items = sample_items();
        let upsert = upsert_prompt("add 5 more laptops", &items, &[]);
        assert!(upsert.contains("| laptops | 20 |"));
        assert!(upsert.contains("add 5 more laptops"));
        assert!(upsert.contains("quantity_mode"));

        let delete = delete_prompt("remove the rice", &items, &[]);
        assert!(delete.contains("| rice | 50 |"));
        assert!(delete.contains("name_contains"));
    }
}
