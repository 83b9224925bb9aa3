//! Query handling: retrieve → compose → generate.
//!
//! [`Assistant`] owns the collaborators and holds no conversation state.
//! The caller threads history in explicitly, either as a
//! [`ConversationMemory`] or through a [`Session`], which also remembers
//! the current [`Mode`].

use anyhow::Result;

use crate::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::error::RagError;
use crate::generate::{self, Generator};
use crate::memory::{render_turns, ConversationMemory};
use crate::models::ConversationTurn;
use crate::prompt::{Mode, PromptComposer};
use crate::retriever::Retriever;

pub struct Assistant {
    retriever: Retriever,
    composer: PromptComposer,
    generator: Box<dyn Generator>,
    k: usize,
    history_turns: usize,
}

impl Assistant {
    pub fn new(
        retriever: Retriever,
        composer: PromptComposer,
        generator: Box<dyn Generator>,
        k: usize,
        history_turns: usize,
    ) -> Self {
        Self {
            retriever,
            composer,
            generator,
            k,
            history_turns,
        }
    }

    /// Wire an assistant from configuration, using the configured
    /// embedding provider and generator.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let provider = embedding::create_provider(&config.embedding)?;
        let generator = generate::create_generator(&config.generation)?;
        Ok(Self::with_parts(config, provider, generator).await)
    }

    pub async fn with_parts(
        config: &Config,
        provider: Box<dyn EmbeddingProvider>,
        generator: Box<dyn Generator>,
    ) -> Self {
        let retriever = Retriever::open(&config.index.dir, provider).await;
        Self::new(
            retriever,
            PromptComposer::new(config.persona.clone()),
            generator,
            config.retrieval.k,
            config.retrieval.history_turns,
        )
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn persona_name(&self) -> &str {
        &self.composer.persona().name
    }

    /// Answer `query` in `mode` given the prior `history`.
    ///
    /// Retrieval problems degrade to a diagnostic context; only a
    /// generation failure is returned as an error.
    pub async fn answer(
        &self,
        query: &str,
        mode: Mode,
        history: &[ConversationTurn],
    ) -> Result<String, RagError> {
        let context = self.retriever.retrieve(query, self.k).await;
        let chat_history = render_turns(history, self.history_turns, self.persona_name());
        let prompt = self.composer.compose(mode, &context, &chat_history, query);

        tracing::debug!(
            mode = %mode,
            model = self.generator.model(),
            context_chars = context.len(),
            "generating answer"
        );
        self.generator.generate(&prompt).await
    }

    pub async fn answer_query(
        &self,
        query: &str,
        memory: &ConversationMemory,
        mode: Mode,
    ) -> Result<String, RagError> {
        self.answer(query, mode, memory.turns()).await
    }

    pub async fn close(self) {
        self.retriever.close().await;
    }
}

/// One user's conversation: history plus the selected mode.
#[derive(Debug, Clone)]
pub struct Session {
    pub memory: ConversationMemory,
    pub mode: Mode,
}

impl Session {
    pub fn new(persona_name: &str, mode: Mode) -> Self {
        Self {
            memory: ConversationMemory::new(persona_name),
            mode,
        }
    }

    /// Ask `question` in the session's current mode. The exchange is
    /// recorded only when generation succeeds.
    pub async fn ask(&mut self, assistant: &Assistant, question: &str) -> Result<String, RagError> {
        let answer = assistant
            .answer_query(question, &self.memory, self.mode)
            .await?;
        self.memory.push_exchange(question, answer.clone());
        Ok(answer)
    }

    pub fn reset(&mut self) {
        self.memory.clear();
    }
}
