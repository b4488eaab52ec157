//! Pipeline stages for PDF-to-brief summarisation.
//!
//! Each submodule implements one transformation step and is testable on its
//! own.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ prompt ──▶ llm ──▶ parse ──▶ render
//! (lopdf)    (text)     (chat)  (JSON)    (lopdf + layout)
//! ```
//!
//! 1. [`extract`]: validate the input path and pull the plain text out of
//!    every page; runs in `spawn_blocking`
//! 2. [`crate::prompts`]: truncate the text and wrap it in the audience
//!    instructions
//! 3. [`llm`]: one chat completion with timeout and optional transport
//!    retries; the only stage with network I/O
//! 4. [`parse`]: strict JSON parse and schema validation of the reply
//! 5. [`render`]: lay the summary out on A4 pages ([`layout`] does the
//!    font metrics and wrapping) and write the PDF atomically

pub mod extract;
pub mod layout;
pub mod llm;
pub mod parse;
pub mod render;
