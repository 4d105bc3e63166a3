//! Generation backends, prompts, and the conversational retrieval pipeline.
//!
//! [`ConversationalRetrievalChain`] runs one question through
//! rephrase, retrieve, answer, and record. [`RetrievalQa`] is the
//! single-turn variant with no memory.

/// Generation service trait and its implementations.
pub mod backends;
/// Generation and retrieval settings.
pub mod config;
/// Retrieved chunks rendered as prompt context.
pub mod context;
/// Config-driven generation client.
pub mod llm;
/// Conversational retrieval chain.
pub mod pipeline;
/// Prompt assembly.
pub mod prompt;
/// Single-turn retrieval QA.
pub mod qa;

pub use backends::GenerationService;
pub use config::{GenerationConfig, GenerationProvider, PipelineConfig};
pub use context::format_context;
pub use llm::LlmClient;
pub use pipeline::{
    ConversationalRetrievalChain, ConversationalRetrievalChainBuilder, PipelineState, TurnOutcome,
};
pub use qa::RetrievalQa;
