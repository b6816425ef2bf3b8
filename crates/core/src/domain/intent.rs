use std::fmt;

use serde::{Deserialize, Serialize};

/// The classifier's label for one utterance. Transient; produced per
/// request and never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Query,
    Upsert,
    Delete,
    Unclear,
}

impl Intent {
    /// Map raw classifier output to an intent. Anything that is not an
    /// exact known label (after trimming whitespace, quotes, and trailing
    /// punctuation) is `Unclear` - no retry, no heuristic fallback.
    pub fn from_model_label(raw: &str) -> Self {
        let label = raw.trim().trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '`');
        match label.to_ascii_lowercase().as_str() {
            "query" | "fetch" => Self::Query,
            "upsert" => Self::Upsert,
            "delete" => Self::Delete,
            _ => Self::Unclear,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Query => "query",
            Self::Upsert => "upsert",
            Self::Delete => "delete",
            Self::Unclear => "unclear",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::Intent;

    #[test]
    fn maps_known_labels() {
        assert_eq!(Intent::from_model_label("query"), Intent::Query);
        assert_eq!(Intent::from_model_label("upsert"), Intent::Upsert);
        assert_eq!(Intent::from_model_label("delete"), Intent::Delete);
        assert_eq!(Intent::from_model_label("unclear"), Intent::Unclear);
    }

    #[test]
    fn accepts_fetch_as_query_alias() {
        // The classifier prompt uses "query", but older-style models echo
        // the verb from examples; "fetch" is the one accepted alias.
        assert_eq!(Intent::from_model_label("fetch"), Intent::Query);
    }

    #[test]
    fn tolerates_quoting_and_casing() {
        assert_eq!(Intent::from_model_label("  \"Delete\".\n"), Intent::Delete);
        assert_eq!(Intent::from_model_label("UPSERT"), Intent::Upsert);
    }

    #[test]
    fn unknown_output_is_unclear() {
        assert_eq!(Intent::from_model_label("i think they want to add items"), Intent::Unclear);
        assert_eq!(Intent::from_model_label(""), Intent::Unclear);
    }
}
