use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error_handler::ConfigError;

/// Represents the provider (backend) used for large language model (LLM) inference.
///
/// Names accepted from configuration are case-insensitive:
///
/// | variant     | accepted names                   |
/// |-------------|----------------------------------|
/// | `Anthropic` | `claude`, `anthropic`            |
/// | `OpenAI`    | `openai`, `chatgpt`, `gpt`       |
/// | `Ollama`    | `ollama`                         |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Anthropic Messages API (Claude models).
    Anthropic,
    /// OpenAI Chat Completions API.
    OpenAI,
    /// Local Ollama runtime for on-device inference.
    Ollama,
}

impl LlmProvider {
    /// Stable lowercase name used in logs and failure records.
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::OpenAI => "openai",
            LlmProvider::Ollama => "ollama",
        }
    }

    /// Whether calls to this provider need an API key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LlmProvider::Ollama)
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" | "anthropic" => Ok(LlmProvider::Anthropic),
            "openai" | "chatgpt" | "gpt" => Ok(LlmProvider::OpenAI),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("Claude".parse::<LlmProvider>().unwrap(), LlmProvider::Anthropic);
        assert_eq!(" gpt ".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!("OLLAMA".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert!(matches!(
            "gemini".parse::<LlmProvider>(),
            Err(ConfigError::UnsupportedProvider(name)) if name == "gemini"
        ));
    }
}
