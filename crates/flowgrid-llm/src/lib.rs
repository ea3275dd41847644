//! Flowgrid LLM layer: provider selection, chat types, and one provider per
//! recognised backend.

pub mod anthropic;
pub mod gemini;
#[cfg(feature = "mock")]
pub mod mock;
pub mod openai;
pub mod provider;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use provider::{LlmError, LlmProvider, LlmResult};
pub use types::{ChatMessage, LlmRequest, LlmResponse, Role, StopReason, ToolCall, ToolDef, Usage};

use std::sync::Arc;

/// Recognised providers. Anything else falls back to Gemini.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAi,
    Anthropic,
}

impl Provider {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "openai" => Provider::OpenAi,
            "anthropic" => Provider::Anthropic,
            _ => Provider::Gemini,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.0-flash",
            Provider::OpenAi => "gpt-4o",
            Provider::Anthropic => "claude-sonnet-4-5",
        }
    }

    /// Environment fallback for deployments without per-credential keys.
    pub fn key_env_var(&self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }
}

/// Constructs a provider for a resolved (backend, key) pair. Injected so
/// tests can substitute a scripted double.
pub trait ProviderFactory: Send + Sync {
    fn make(&self, provider: Provider, api_key: &str) -> Arc<dyn LlmProvider>;
}

/// The real thing: HTTP providers against their public endpoints.
#[derive(Default)]
pub struct HttpProviderFactory;

impl ProviderFactory for HttpProviderFactory {
    fn make(&self, provider: Provider, api_key: &str) -> Arc<dyn LlmProvider> {
        match provider {
            Provider::Gemini => Arc::new(GeminiProvider::new(api_key)),
            Provider::OpenAi => Arc::new(OpenAiProvider::new(api_key)),
            Provider::Anthropic => Arc::new(AnthropicProvider::new(api_key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parsing_falls_back_to_gemini() {
        assert_eq!(Provider::parse("openai"), Provider::OpenAi);
        assert_eq!(Provider::parse("Anthropic"), Provider::Anthropic);
        assert_eq!(Provider::parse("gemini"), Provider::Gemini);
        assert_eq!(Provider::parse("mistral"), Provider::Gemini);
        assert_eq!(Provider::parse(""), Provider::Gemini);
    }

    #[test]
    fn default_models() {
        assert_eq!(Provider::Gemini.default_model(), "gemini-2.0-flash");
        assert_eq!(Provider::OpenAi.default_model(), "gpt-4o");
        assert_eq!(Provider::Anthropic.default_model(), "claude-sonnet-4-5");
    }
}
