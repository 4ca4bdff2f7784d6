//! Chat and embedding provider abstraction and backend implementations.

pub mod any;
pub mod error;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod prompt;
pub mod provider;

pub use error::LlmError;
pub use prompt::PromptTemplate;
pub use provider::{GenerationOptions, LlmProvider, Message, Role};
