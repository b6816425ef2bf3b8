//! Domain types, configuration, and prompt templates for stocktalk.
//!
//! Stocktalk is a natural-language front-end over a single-table inventory
//! database. This crate holds everything the other members share:
//!
//! - `domain` - the inventory item, filters and change descriptions, the
//!   bounded conversation history, and the classified intent
//! - `config` - layered application configuration (file, env, overrides)
//! - `errors` - the request-level error taxonomy and its user-safe replies
//! - `prompts` - per-intent prompt builders sent to the language model
//!
//! The language model is strictly a translator here: it labels utterances
//! and extracts structured fields. Every database effect is a deterministic
//! decision made by the handlers and the repository.

pub mod config;
pub mod domain;
pub mod errors;
pub mod prompts;
