use anyhow::{Result, Error};
use futures::{stream, StreamExt, TryStreamExt};
use std::sync::Arc;
use crate::providers::traits::CompletionProvider;

const CONCURRENT_REQUESTS: usize = 4;

/// Embeds large sets of texts in batches, several requests in flight at once.
#[derive(Clone)]
pub struct EmbeddingGenerator {
    provider: Arc<dyn CompletionProvider>,
    batch_size: usize,
}

impl EmbeddingGenerator {
    pub fn new(provider: Arc<dyn CompletionProvider>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
        }
    }

    pub async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        self.provider.generate_embedding(text).await
    }

    /// One embedding per input, in input order.
    pub async fn generate_batch_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let batches: Vec<Vec<String>> = texts
            .chunks(self.batch_size)
            .map(|batch| batch.to_vec())
            .collect();
        log::debug!("Embedding {} texts in {} batches", texts.len(), batches.len());

        let results: Vec<Vec<Vec<f32>>> = stream::iter(batches)
            .map(|batch| {
                let provider = Arc::clone(&self.provider);
                async move {
                    let embeddings = provider.generate_embeddings(&batch).await?;
                    if embeddings.len() != batch.len() {
                        return Err(Error::msg(format!(
                            "Embedding batch returned {} vectors for {} texts",
                            embeddings.len(),
                            batch.len()
                        )));
                    }
                    Ok(embeddings)
                }
            })
            .buffered(CONCURRENT_REQUESTS)
            .try_collect()
            .await?;

        Ok(results.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::{embed_words, MockProvider};

    #[tokio::test]
    async fn test_batches_preserve_order() {
        let provider = Arc::new(MockProvider::replying(""));
        let generator = EmbeddingGenerator::new(provider.clone(), 2);

        let texts: Vec<String> = ["alpha", "beta", "gamma", "delta", "epsilon"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let embeddings = generator.generate_batch_embeddings(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 5);
        for (text, embedding) in texts.iter().zip(&embeddings) {
            assert_eq!(embedding, &embed_words(text));
        }
        assert_eq!(provider.embedding_calls(), 5);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let generator = EmbeddingGenerator::new(Arc::new(MockProvider::replying("")), 10);
        assert!(generator.generate_batch_embeddings(&[]).await.unwrap().is_empty());
    }
}
