#[cfg(feature = "mock")]
use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;

use crate::error::LlmError;
use crate::provider::{GenerationOptions, LlmProvider, Message};

/// Generates a match over all `AnyProvider` variants, binding the inner provider
/// and evaluating the given expression for each arm.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyProvider::Ollama($p) => $expr,
            AnyProvider::OpenAi($p) => $expr,
            #[cfg(feature = "mock")]
            AnyProvider::Mock($p) => $expr,
        }
    };
}

/// Statically dispatched provider selected from configuration at startup.
#[derive(Debug, Clone)]
pub enum AnyProvider {
    Ollama(OllamaProvider),
    OpenAi(OpenAiProvider),
    #[cfg(feature = "mock")]
    Mock(MockProvider),
}

impl LlmProvider for AnyProvider {
    async fn chat(
        &self,
        messages: &[Message],
        options: GenerationOptions,
    ) -> Result<String, LlmError> {
        delegate_provider!(self, |p| p.chat(messages, options).await)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        delegate_provider!(self, |p| p.embed(text).await)
    }

    fn supports_embeddings(&self) -> bool {
        delegate_provider!(self, |p| p.supports_embeddings())
    }

    fn name(&self) -> &'static str {
        delegate_provider!(self, |p| p.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegates_name_and_embedding_support() {
        let openai = AnyProvider::OpenAi(OpenAiProvider::new(
            "k".into(),
            "http://localhost".into(),
            "m".into(),
            16,
            None,
        ));
        assert_eq!(openai.name(), "openai");
        assert!(!openai.supports_embeddings());

        let ollama = AnyProvider::Ollama(OllamaProvider::new(
            "http://localhost:11434",
            "llama3".into(),
            "nomic-embed-text".into(),
        ));
        assert_eq!(ollama.name(), "ollama");
        assert!(ollama.supports_embeddings());
    }

    #[cfg(feature = "mock")]
    #[tokio::test]
    async fn delegates_chat_to_mock() {
        let any = AnyProvider::Mock(MockProvider::with_responses(vec!["yes".into()]));
        let out = any
            .chat(&[Message::user("q")], GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(out, "yes");
    }
}
