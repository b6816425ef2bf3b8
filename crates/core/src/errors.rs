use thiserror::Error;

/// Invariant violations on domain values.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("item name must be non-empty")]
    EmptyItemName,
    #[error("quantity must be >= 0, got {0}")]
    NegativeQuantity(i64),
}

/// Request-level failure taxonomy for one chat turn.
///
/// Not-found is deliberately absent: a delete or query that matches no rows
/// is an informational reply, not an error. External failures carry detail
/// for the logs but are never shown to the user verbatim.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The classifier's output did not map to a known intent.
    #[error("could not classify the request")]
    Classification,
    /// The model's output could not be parsed into the handler's schema;
    /// no database call was made.
    #[error("could not extract structured fields: {0}")]
    Extraction(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// The database or the model endpoint failed (network, auth, quota).
    #[error("external service failure: {0}")]
    ExternalService(String),
}

impl ChatError {
    /// The reply shown to the user in place of a handler result. Raw error
    /// detail stays in the logs.
    pub fn user_reply(&self) -> String {
        match self {
            Self::Classification => {
                "I couldn't tell what you want to do. Please ask about viewing, \
                 adding/updating, or deleting inventory items."
                    .to_string()
            }
            Self::Extraction(_) | Self::Domain(_) => {
                "I couldn't work out the item details from that. Could you rephrase, \
                 naming the item (and quantity if relevant)?"
                    .to_string()
            }
            Self::ExternalService(_) => {
                "Sorry, something went wrong while processing your request. Please try again."
                    .to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatError, DomainError};

    #[test]
    fn classification_reply_asks_for_clarification() {
        let reply = ChatError::Classification.user_reply();
        assert!(reply.contains("couldn't tell"));
    }

    #[test]
    fn extraction_reply_never_leaks_detail() {
        let reply = ChatError::Extraction("missing field `item_name`".to_string()).user_reply();
        assert!(!reply.contains("item_name"));
        assert!(reply.contains("rephrase"));
    }

    #[test]
    fn domain_violations_read_like_extraction_failures() {
        let reply = ChatError::from(DomainError::EmptyItemName).user_reply();
        assert!(reply.contains("rephrase"));
    }

    #[test]
    fn external_failures_surface_a_generic_message() {
        let reply = ChatError::ExternalService("HTTP 503 from model endpoint".to_string())
            .user_reply();
        assert!(!reply.contains("503"));
        assert!(reply.contains("try again"));
    }
}
