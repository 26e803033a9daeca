//! # Structured Output Coercion
//!
//! Bridges the strict response contract and what a generation service will
//! actually accept and return. Two directions:
//!
//! | Function | Direction | Purpose |
//! |----------|-----------|---------|
//! | [`sanitize_schema`] | outbound | Strip schema keywords the service rejects |
//! | [`parse_loose_json`] | inbound | Recover a JSON object from fenced or double-encoded text |
//!
//! Validation against the typed contract happens afterwards, in
//! [`GenerationClient`](crate::client::GenerationClient).

pub mod error;
pub mod json;
pub mod schema;

pub use error::ParseError;
pub use json::{parse_loose_json, strip_code_fence};
pub use schema::{sanitize_schema, UNSUPPORTED_SCHEMA_KEYS};
