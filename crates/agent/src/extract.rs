//! Structured extraction from free-form model output.
//!
//! Model replies are untrusted, structured-ish input: the JSON object may
//! be wrapped in code fences or prose. Extraction locates the first
//! complete JSON object, deserializes it against the per-intent schema, and
//! validates the fields. Any violation is a [`ChatError::Extraction`] and
//! the handler makes no database call - a missing required field is never
//! silently defaulted.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use stocktalk_core::domain::{DeleteTarget, ItemChange, ItemFilter, QuantityChange};
use stocktalk_core::errors::ChatError;

/// Upsert schema. `quantity` may be null when the request only changes the
/// description; `quantity_mode` defaults to overwrite when the model omits
/// it, matching the "ambiguous means set" extraction rule.
#[derive(Debug, Deserialize)]
pub struct UpsertExtraction {
    pub item_name: String,
    pub quantity: Option<i64>,
    #[serde(default)]
    pub quantity_mode: QuantityMode,
    pub description: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityMode {
    #[default]
    Set,
    Add,
}

impl UpsertExtraction {
    pub fn into_change(self) -> Result<ItemChange, ChatError> {
        let quantity = self.quantity.map(|value| match self.quantity_mode {
            QuantityMode::Set => QuantityChange::Set(value),
            QuantityMode::Add => QuantityChange::Add(value),
        });

        let description = self.description.filter(|text| !text.trim().is_empty());
        Ok(ItemChange::new(self.item_name, quantity, description)?)
    }
}

/// Delete schema: exactly one way to name the target. When the model emits
/// both, the exact name wins (it is the narrower request).
#[derive(Debug, Deserialize)]
pub struct DeleteExtraction {
    pub item_name: Option<String>,
    pub name_contains: Option<String>,
}

impl DeleteExtraction {
    pub fn into_target(self) -> Result<DeleteTarget, ChatError> {
        if let Some(item_name) = self.item_name.filter(|name| !name.trim().is_empty()) {
            return Ok(DeleteTarget::Name(item_name));
        }
        if let Some(needle) = self.name_contains.filter(|needle| !needle.trim().is_empty()) {
            return Ok(DeleteTarget::Filter(ItemFilter::NameContains(needle)));
        }
        Err(ChatError::Extraction(
            "delete extraction named no target (expected item_name or name_contains)".to_string(),
        ))
    }
}

/// Parse the first JSON object out of the model text into `T`.
pub fn parse_extraction<T: DeserializeOwned>(model_output: &str) -> Result<T, ChatError> {
    let object = first_json_object(model_output).ok_or_else(|| {
        ChatError::Extraction("model output contained no JSON object".to_string())
    })?;

    serde_json::from_str(object).map_err(|error| ChatError::Extraction(error.to_string()))
}

/// Parse a query reply into an [`ItemFilter`].
pub fn parse_filter(model_output: &str) -> Result<ItemFilter, ChatError> {
    parse_extraction::<ItemFilter>(model_output)
}

/// Locate the first balanced `{...}` in `text`, tolerating code fences and
/// surrounding prose. Brace counting is string-aware so embedded braces in
/// values do not end the scan early.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
