//! Prompt composition: pure mapping from selections and profiles to prompt text.
//!
//! Layout:
//! - `catalog.rs`: themes, power pools and per-theme prompt/visual profiles
//! - `prompt.rs`: text, origin and portrait prompt builders
//! - `sanitize.rs`: image-safety scrubbing of free text

pub mod catalog;
pub mod prompt;
pub mod sanitize;

pub use prompt::{ComposedPrompt, origin_prompt, portrait_prompt, text_prompt};
