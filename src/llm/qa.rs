use anyhow::{Result, Error};
use std::sync::Arc;
use crate::database::vector_db::{ScoredChunk, VectorStore};
use crate::llm::embeddings::EmbeddingGenerator;
use crate::providers::traits::CompletionProvider;

/// Answers a question from the `k` most similar chunks, all stuffed into a
/// single prompt.
#[derive(Clone)]
pub struct RetrievalQA {
    provider: Arc<dyn CompletionProvider>,
    embeddings: EmbeddingGenerator,
    store: Arc<dyn VectorStore>,
    k: usize,
}

pub fn build_prompt(context: &[ScoredChunk], question: &str) -> String {
    let context = context
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Use the following pieces of context to answer the question at the end. \
        If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\n\
        {}\n\n\
        Question: {}\n\
        Helpful Answer:",
        context, question
    )
}

impl RetrievalQA {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        embeddings: EmbeddingGenerator,
        store: Arc<dyn VectorStore>,
        k: usize,
    ) -> Self {
        Self {
            provider,
            embeddings,
            store,
            k: k.max(1),
        }
    }

    pub async fn retrieve(&self, question: &str) -> Result<Vec<ScoredChunk>> {
        let query_embedding = self.embeddings.generate_embedding(question).await?;
        self.store
            .similarity_search(&query_embedding, self.k)
            .await
            .map_err(|e| Error::msg(format!("Failed to search: {}", e)))
    }

    pub async fn run(&self, question: &str) -> Result<String> {
        let context = self.retrieve(question).await?;
        log::debug!("Retrieved {} chunks for question", context.len());

        let answer = self.provider.complete(&build_prompt(&context, question)).await?;
        Ok(answer.trim().to_string())
    }

    pub fn provider(&self) -> Arc<dyn CompletionProvider> {
        Arc::clone(&self.provider)
    }
}
