use anyhow::Result;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use crate::llm::qa::RetrievalQA;

pub const NO_ANSWER: &str = "I'm sorry, I couldn't find an answer to that question.";
pub const TRANSLATION_FAILED: &str = "Translation failed.";
pub const DEFAULT_GREETING: &str = "🤖 Hello! I am your AI assistant. Please provide your details to begin.";

pub fn greeting(name: &str) -> String {
    format!("🤖 Welcome, {}! 🎉 I am here to assist you with queries from my trained knowledge.", name)
}

pub fn farewell(name: &str) -> String {
    format!("👋 Bye, {}! Have a great day! 😊", name)
}

pub fn translation_prompt(hindi_response: &str) -> String {
    format!(
        "Translate the following Hindi text to English:\n\n{}\n\nProvide a natural English answer.",
        hindi_response
    )
}

/// Answers questions from the Hindi documents and replies in English.
pub struct Assistant {
    qa: RetrievalQA,
    cache: Option<Mutex<LruCache<String, String>>>,
}

impl Assistant {
    /// `cache_size` of zero disables answer caching.
    pub fn new(qa: RetrievalQA, cache_size: usize) -> Self {
        Self {
            qa,
            cache: NonZeroUsize::new(cache_size).map(|size| Mutex::new(LruCache::new(size))),
        }
    }

    pub async fn handle_user_input(&self, user_query: &str) -> Result<String> {
        let key = user_query.trim().to_string();
        let cached = self
            .cache
            .as_ref()
            .and_then(|cache| cache.lock().get(&key).cloned());
        if let Some(answer) = cached {
            log::debug!("Answer cache hit");
            return Ok(answer);
        }

        let answer = self.answer(user_query).await?;

        if let Some(cache) = &self.cache {
            cache.lock().put(key, answer.clone());
        }
        Ok(answer)
    }

    async fn answer(&self, user_query: &str) -> Result<String> {
        let hindi_response = self.qa.run(user_query).await?;
        if hindi_response.is_empty() {
            return Ok(NO_ANSWER.to_string());
        }

        let english_response = self
            .qa
            .provider()
            .complete(&translation_prompt(&hindi_response))
            .await?;
        let english_response = english_response.trim();
        if english_response.is_empty() {
            return Ok(TRANSLATION_FAILED.to_string());
        }
        Ok(english_response.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::vector_db::{InMemoryVectorStore, VectorStore};
    use crate::llm::embeddings::EmbeddingGenerator;
    use crate::providers::mock::MockProvider;
    use std::sync::Arc;

    async fn assistant_with(provider: Arc<MockProvider>, cache_size: usize) -> Assistant {
        let embeddings = EmbeddingGenerator::new(provider.clone(), 8);
        let store = Arc::new(InMemoryVectorStore::new());
        let texts = vec!["भारत की राजधानी नई दिल्ली है".to_string()];
        let vectors = embeddings.generate_batch_embeddings(&texts).await.unwrap();
        store.add(texts, vectors).await.unwrap();
        Assistant::new(RetrievalQA::new(provider, embeddings, store, 4), cache_size)
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            greeting("Ravi"),
            "🤖 Welcome, Ravi! 🎉 I am here to assist you with queries from my trained knowledge."
        );
        assert_eq!(farewell("friend"), "👋 Bye, friend! Have a great day! 😊");
        assert_eq!(
            translation_prompt("नमस्ते"),
            "Translate the following Hindi text to English:\n\nनमस्ते\n\nProvide a natural English answer."
        );
    }

    #[tokio::test]
    async fn test_answer_is_translated() {
        let provider = Arc::new(MockProvider::new(|prompt| {
            if prompt.starts_with("Translate the following Hindi text") {
                Ok(" The capital of India is New Delhi. ".to_string())
            } else {
                Ok("नई दिल्ली".to_string())
            }
        }));
        let assistant = assistant_with(provider.clone(), 0).await;

        let answer = assistant.handle_user_input("भारत की राजधानी क्या है?").await.unwrap();
        assert_eq!(answer, "The capital of India is New Delhi.");

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[1], translation_prompt("नई दिल्ली"));
    }

    #[tokio::test]
    async fn test_empty_answer_skips_translation() {
        let provider = Arc::new(MockProvider::replying("   "));
        let assistant = assistant_with(provider.clone(), 0).await;

        let answer = assistant.handle_user_input("anything").await.unwrap();
        assert_eq!(answer, NO_ANSWER);
        assert_eq!(provider.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_translation() {
        let provider = Arc::new(MockProvider::new(|prompt| {
            if prompt.starts_with("Translate") {
                Ok(String::new())
            } else {
                Ok("उत्तर".to_string())
            }
        }));
        let assistant = assistant_with(provider, 0).await;
        assert_eq!(assistant.handle_user_input("q").await.unwrap(), TRANSLATION_FAILED);
    }

    #[tokio::test]
    async fn test_cache_reuses_answers() {
        let provider = Arc::new(MockProvider::replying("answer"));
        let assistant = assistant_with(provider.clone(), 10).await;

        assistant.handle_user_input("same question").await.unwrap();
        assistant.handle_user_input("  same question ").await.unwrap();
        // one retrieval answer plus one translation
        assert_eq!(provider.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let provider = Arc::new(MockProvider::failing("boom"));
        let assistant = assistant_with(provider.clone(), 10).await;

        assert!(assistant.handle_user_input("q").await.is_err());
        assert!(assistant.handle_user_input("q").await.is_err());
        assert_eq!(provider.prompts().len(), 2);
    }
}
