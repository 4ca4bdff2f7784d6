use docent_llm::{GenerationOptions, LlmProvider, Message, PromptTemplate};

use crate::outcome::Outcome;
use crate::prompts;

pub const SUCCESS_MESSAGE: &str = "Answer generated successfully";

/// Produces the final reply, either grounded in retrieved context or as a
/// generic conversational response.
#[derive(Debug, Clone)]
pub struct AnswerSynthesizer<P> {
    provider: P,
    answer_template: PromptTemplate,
    reply_template: PromptTemplate,
}

impl<P: LlmProvider> AnswerSynthesizer<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            answer_template: PromptTemplate::new(prompts::ANSWER),
            reply_template: PromptTemplate::new(prompts::GENERIC_REPLY),
        }
    }

    /// Answer `query` strictly from `context`. An empty context is still sent.
    pub async fn answer(&self, query: &str, context: &str, temperature: f32) -> Outcome {
        let prompt = self
            .answer_template
            .render(&[("context", context), ("query", query)]);
        self.complete(prompt, GenerationOptions::with_temperature(temperature))
            .await
    }

    /// Reply to greetings and generic queries without any context.
    pub async fn respond(&self, query: &str) -> Outcome {
        let prompt = self.reply_template.render(&[("query", query)]);
        self.complete(prompt, GenerationOptions::default()).await
    }

    async fn complete(&self, prompt: String, options: GenerationOptions) -> Outcome {
        match self.provider.chat(&[Message::user(prompt)], options).await {
            Ok(text) => Outcome::success(SUCCESS_MESSAGE).with_response(text),
            Err(e) => {
                tracing::error!(provider = self.provider.name(), "answer generation failed: {e}");
                Outcome::failure(e.to_string())
            }
        }
    }
}
