//! AI configuration from environment variables.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use super::prompts::load_instruction;

/// Default Gemini API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model to use.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-001";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: String, value: String },

    #[error("Failed to read prompt file {}: {source}", path.display())]
    PromptFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Prompt file {} is empty", .0.display())]
    EmptyPrompt(PathBuf),
}

/// Which inference backend to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Gemini,
    Fake,
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "fake" => Ok(Provider::Fake),
            _ => Err(ConfigError::InvalidValue {
                var: "NUTRITION_AI_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Gemini => f.write_str("gemini"),
            Provider::Fake => f.write_str("fake"),
        }
    }
}

/// Inference client configuration.
#[derive(Clone)]
pub struct AiConfig {
    pub provider: Provider,
    /// API key for Gemini. Always present when `provider` is `Gemini`.
    pub api_key: Option<String>,
    /// Model name (e.g., "gemini-2.0-flash-001", "gemini-1.5-flash-002").
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Instruction text sent with every image.
    pub instruction: String,
}

impl fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("instruction_len", &self.instruction.len())
            .finish()
    }
}

impl AiConfig {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `GOOGLE_API_KEY`: API key for Gemini (unless the provider is "fake")
    ///
    /// Optional:
    /// - `NUTRITION_AI_PROVIDER`: "gemini" or "fake" (default: "gemini")
    /// - `NUTRITION_AI_MODEL`: Model name (default: "gemini-2.0-flash-001")
    /// - `NUTRITION_AI_BASE_URL`: API base URL (default: the public v1beta endpoint)
    /// - `NUTRITION_PROMPT_FILE`: Path to a replacement instruction
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match lookup("NUTRITION_AI_PROVIDER") {
            Some(value) => value.parse()?,
            None => Provider::default(),
        };

        let api_key = lookup("GOOGLE_API_KEY").filter(|key| !key.trim().is_empty());
        if provider == Provider::Gemini && api_key.is_none() {
            return Err(ConfigError::MissingEnvVar("GOOGLE_API_KEY".to_string()));
        }

        let model = lookup("NUTRITION_AI_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url = lookup("NUTRITION_AI_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let prompt_file = lookup("NUTRITION_PROMPT_FILE").map(PathBuf::from);
        let instruction = load_instruction(prompt_file.as_deref())?;

        Ok(Self {
            provider,
            api_key,
            model,
            base_url,
            instruction,
        })
    }
}
