use crate::backends::GenerationService;
use crate::config::PipelineConfig;
use crate::context::format_context;
use crate::prompt;
use ragchat_core::{CancellationToken, Message, RagError, RagResult};
use ragchat_memory::{EmbeddingProvider, Retriever, SearchResult};
use ragchat_session::ConversationMemory;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where an invocation currently is. `Recorded` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    /// Input validated.
    Received,
    /// Standalone question available.
    Rephrased,
    /// Context chunks fetched.
    Retrieved,
    /// Answer generated, not yet recorded.
    Answered,
    /// Question and answer appended to the session.
    Recorded,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineState::Received => "received",
            PipelineState::Rephrased => "rephrased",
            PipelineState::Retrieved => "retrieved",
            PipelineState::Answered => "answered",
            PipelineState::Recorded => "recorded",
        };
        f.write_str(name)
    }
}

/// Validated input.
#[derive(Debug, Clone)]
pub struct ReceivedQuestion {
    /// Caller-chosen conversation id.
    pub session_id: String,
    /// The question as the user asked it.
    pub question: String,
}

/// Output of the rephrase stage.
#[derive(Debug, Clone)]
pub struct RephrasedQuestion {
    /// Caller-chosen conversation id.
    pub session_id: String,
    /// The question as the user asked it.
    pub question: String,
    /// The question rewritten to stand without history.
    pub standalone_question: String,
    /// History as read at the start of the turn.
    pub history: Vec<Message>,
}

/// Output of the retrieve stage.
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    /// Caller-chosen conversation id.
    pub session_id: String,
    /// The question as the user asked it.
    pub question: String,
    /// The question rewritten to stand without history.
    pub standalone_question: String,
    /// History as read at the start of the turn.
    pub history: Vec<Message>,
    /// Hits in rank order.
    pub documents: Vec<SearchResult>,
    /// `documents` joined with `<doc>` delimiters.
    pub context: String,
}

/// Output of the answer stage, not yet committed to memory.
#[derive(Debug, Clone)]
pub struct GeneratedAnswer {
    /// Caller-chosen conversation id.
    pub session_id: String,
    /// The question as the user asked it.
    pub question: String,
    /// The question rewritten to stand without history.
    pub standalone_question: String,
    /// Retrieved chunks in rank order.
    pub documents: Vec<SearchResult>,
    /// Generated answer.
    pub answer: String,
}

/// Everything observable about a completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Caller-chosen conversation id.
    pub session_id: String,
    /// The question as the user asked it.
    pub question: String,
    /// The question rewritten to stand without history.
    pub standalone_question: String,
    /// Retrieved chunks in rank order.
    pub documents: Vec<SearchResult>,
    /// Generated answer.
    pub answer: String,
    /// Last state reached; `Recorded` on success.
    pub state: PipelineState,
}

/// Conversational retrieval-augmented question answering.
///
/// One invocation runs `receive → rephrase → retrieve → answer → record`.
/// Each stage is a typed function consuming the previous stage's output.
/// History is written only by `record`, after a successful answer, so any
/// failure or cancellation earlier leaves the session untouched.
pub struct ConversationalRetrievalChain {
    embedder: Arc<dyn EmbeddingProvider>,
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn GenerationService>,
    memory: Arc<dyn ConversationMemory>,
    config: PipelineConfig,
}

impl ConversationalRetrievalChain {
    /// Start assembling a chain.
    pub fn builder() -> ConversationalRetrievalChainBuilder {
        ConversationalRetrievalChainBuilder::default()
    }

    /// Retrieval settings in use.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The conversation memory turns are recorded into.
    pub fn memory(&self) -> &Arc<dyn ConversationMemory> {
        &self.memory
    }

    /// Answer `question` within `session_id`.
    pub async fn invoke(&self, session_id: &str, question: &str) -> RagResult<String> {
        self.invoke_with_cancel(session_id, question, &CancellationToken::new())
            .await
    }

    /// Like [`invoke`](Self::invoke), aborting with `RagError::Cancelled` if `cancel` fires.
    pub async fn invoke_with_cancel(
        &self,
        session_id: &str,
        question: &str,
        cancel: &CancellationToken,
    ) -> RagResult<String> {
        Ok(self.invoke_traced(session_id, question, cancel).await?.answer)
    }

    /// Run every stage and return the full [`TurnOutcome`].
    pub async fn invoke_traced(
        &self,
        session_id: &str,
        question: &str,
        cancel: &CancellationToken,
    ) -> RagResult<TurnOutcome> {
        let received = Self::receive(session_id, question)?;
        let rephrased = self.rephrase(received, cancel).await?;
        let retrieved = self.retrieve(rephrased, cancel).await?;
        let answered = self.answer(retrieved, cancel).await?;
        self.record(answered, cancel).await
    }

    /// Validate the raw input.
    pub fn receive(session_id: &str, question: &str) -> RagResult<ReceivedQuestion> {
        if session_id.is_empty() {
            return Err(RagError::InvalidSession(session_id.to_string()));
        }
        if question.trim().is_empty() {
            return Err(RagError::InvalidInput("question is empty".to_string()));
        }
        debug!(session_id = session_id, state = %PipelineState::Received, "pipeline transition");
        Ok(ReceivedQuestion {
            session_id: session_id.to_string(),
            question: question.to_string(),
        })
    }

    /// Turn a follow-up into a standalone question.
    ///
    /// With no history the question is used unchanged and no generation call is made.
    pub async fn rephrase(
        &self,
        input: ReceivedQuestion,
        cancel: &CancellationToken,
    ) -> RagResult<RephrasedQuestion> {
        let history = self.memory.get_history(&input.session_id).await?;

        let standalone_question = if history.is_empty() {
            input.question.clone()
        } else {
            let messages = prompt::rephrase_messages(&history, &input.question);
            let reply = cancel
                .run("rephrase", self.generator.generate(&messages))
                .await
                .map_err(RagError::into_generation_failure)?;
            let reply = reply.trim();
            if reply.is_empty() {
                return Err(RagError::UpstreamGenerationFailure(
                    "rephrase step returned an empty question".to_string(),
                ));
            }
            reply.to_string()
        };

        info!(
            session_id = %input.session_id,
            history = history.len(),
            state = %PipelineState::Rephrased,
            "pipeline transition"
        );
        Ok(RephrasedQuestion {
            session_id: input.session_id,
            question: input.question,
            standalone_question,
            history,
        })
    }

    /// Embed the standalone question and fetch the top-k chunks.
    pub async fn retrieve(
        &self,
        input: RephrasedQuestion,
        cancel: &CancellationToken,
    ) -> RagResult<RetrievedContext> {
        let vector = cancel
            .run("embed", self.embedder.embed(&input.standalone_question))
            .await
            .map_err(RagError::into_embedding_failure)?;
        let documents = self.retriever.query(&vector, self.config.top_k).await?;
        let context = format_context(&documents);

        info!(
            session_id = %input.session_id,
            k = self.config.top_k,
            chunks = documents.len(),
            state = %PipelineState::Retrieved,
            "pipeline transition"
        );
        Ok(RetrievedContext {
            session_id: input.session_id,
            question: input.question,
            standalone_question: input.standalone_question,
            history: input.history,
            documents,
            context,
        })
    }

    /// Generate the answer from context, standalone question, and history.
    pub async fn answer(
        &self,
        input: RetrievedContext,
        cancel: &CancellationToken,
    ) -> RagResult<GeneratedAnswer> {
        let messages =
            prompt::answer_messages(&input.context, &input.standalone_question, &input.history);
        let answer = cancel
            .run("answer", self.generator.generate(&messages))
            .await
            .map_err(RagError::into_generation_failure)?;

        info!(
            session_id = %input.session_id,
            answer_len = answer.len(),
            state = %PipelineState::Answered,
            "pipeline transition"
        );
        Ok(GeneratedAnswer {
            session_id: input.session_id,
            question: input.question,
            standalone_question: input.standalone_question,
            documents: input.documents,
            answer,
        })
    }

    /// Commit the user question and the answer to memory.
    pub async fn record(
        &self,
        input: GeneratedAnswer,
        cancel: &CancellationToken,
    ) -> RagResult<TurnOutcome> {
        if cancel.is_cancelled() {
            warn!(session_id = %input.session_id, "cancelled before recording; history untouched");
            return Err(RagError::Cancelled {
                stage: "record".to_string(),
            });
        }
        self.memory
            .append_all(
                &input.session_id,
                vec![
                    Message::user(input.question.clone()),
                    Message::assistant(input.answer.clone()),
                ],
            )
            .await?;

        info!(session_id = %input.session_id, state = %PipelineState::Recorded, "pipeline transition");
        Ok(TurnOutcome {
            session_id: input.session_id,
            question: input.question,
            standalone_question: input.standalone_question,
            documents: input.documents,
            answer: input.answer,
            state: PipelineState::Recorded,
        })
    }
}

/// Assembles a [`ConversationalRetrievalChain`]; every collaborator is required.
#[derive(Default)]
pub struct ConversationalRetrievalChainBuilder {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    retriever: Option<Arc<dyn Retriever>>,
    generator: Option<Arc<dyn GenerationService>>,
    memory: Option<Arc<dyn ConversationMemory>>,
    config: PipelineConfig,
}

impl ConversationalRetrievalChainBuilder {
    /// Embedder used for standalone questions.
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Index queried for context.
    pub fn retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Backend for the rephrase and answer calls.
    pub fn generator(mut self, generator: Arc<dyn GenerationService>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Session history store.
    pub fn memory(mut self, memory: Arc<dyn ConversationMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Override the default retrieval settings.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Fails with `InvalidConfiguration` when a collaborator is missing or `top_k` is 0.
    pub fn build(self) -> RagResult<ConversationalRetrievalChain> {
        self.config.validate()?;
        let missing = |what: &str| RagError::InvalidConfiguration(format!("pipeline has no {what}"));
        Ok(ConversationalRetrievalChain {
            embedder: self.embedder.ok_or_else(|| missing("embedder"))?,
            retriever: self.retriever.ok_or_else(|| missing("retriever"))?,
            generator: self.generator.ok_or_else(|| missing("generator"))?,
            memory: self.memory.ok_or_else(|| missing("conversation memory"))?,
            config: self.config,
        })
    }
}
