//! Render engine client.
//!
//! The engine does the actual decoding, filtering and encoding. This crate
//! streams the source file and the validated command to it in one request and
//! reads back where the result landed.

pub mod client;
pub mod types;

pub use client::{redact_endpoint, resolve_output_url, HttpRenderEngine, RenderEngine};
pub use types::*;
