//! AI prompt templates.

pub mod nutrition;

pub use nutrition::{load_instruction, DEFAULT_NUTRITION_PROMPT, NUTRITION_PROMPT_NAME};
