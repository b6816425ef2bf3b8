//! Agent runtime - intent classification, extraction, and dispatch.
//!
//! This crate is the "brain" of stocktalk. Each user turn flows through a
//! constrained, strictly sequential pipeline:
//!
//! 1. **Classification** (`classifier`) - one model call labels the
//!    utterance as query/upsert/delete/unclear
//! 2. **Extraction** (`extract`) - the matching handler asks the model for
//!    a single JSON object and validates it against a serde schema
//! 3. **Execution** (`handlers`) - one parameterized repository call
//! 4. **Reply** (`session`) - the result is formatted, appended to the
//!    bounded conversation history, and returned
//!
//! # Safety Principle
//!
//! The model is strictly a translator. It never decides what hits the
//! database: malformed or partial model output is an extraction failure and
//! no repository call is made. There are no retries anywhere; both external
//! calls either succeed or surface as a failure reply.

pub mod classifier;
pub mod extract;
pub mod handlers;
pub mod llm;
pub mod session;
