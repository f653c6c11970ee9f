//! Deterministic provider for tests: embeddings are word-hash histograms and
//! completions come from a caller-supplied function.

use async_trait::async_trait;
use anyhow::{Result, anyhow};
use parking_lot::Mutex;
use crate::providers::traits::CompletionProvider;

pub const MOCK_DIMENSION: usize = 32;

type Responder = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

pub struct MockProvider {
    responder: Responder,
    prompts: Mutex<Vec<String>>,
    embedding_calls: Mutex<usize>,
}

impl MockProvider {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            prompts: Mutex::new(Vec::new()),
            embedding_calls: Mutex::new(0),
        }
    }

    pub fn replying(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_| Ok(reply.clone()))
    }

    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_| Err(anyhow!(message.clone())))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn embedding_calls(&self) -> usize {
        *self.embedding_calls.lock()
    }
}

pub fn embed_words(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; MOCK_DIMENSION];
    for word in text.split_whitespace() {
        let word = word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
        if word.is_empty() {
            continue;
        }
        let bucket = word
            .bytes()
            .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
            % MOCK_DIMENSION;
        vector[bucket] += 1.0;
    }
    vector
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        (self.responder)(prompt)
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        *self.embedding_calls.lock() += 1;
        Ok(embed_words(text))
    }

    fn model_info(&self) -> String {
        "mock".to_string()
    }
}
