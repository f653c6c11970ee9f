//! Startup pipeline: documents in the data folder become a searchable index.

use log::info;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;
use crate::database::{InMemoryVectorStore, QdrantVectorStore, VectorDBError, VectorStore};
use crate::document::{
    combine_documents, DocumentError, DocumentProcessor, OcrPipeline, RecursiveCharacterTextSplitter,
};
use crate::llm::{EmbeddingGenerator, RetrievalQA};
use crate::providers::traits::CompletionProvider;

#[derive(Error, Debug)]
pub enum KnowledgeBaseError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("Vector store error: {0}")]
    VectorStore(#[from] VectorDBError),
    #[error("Embedding failed: {0}")]
    Embedding(String),
    #[error("The documents produced no text chunks")]
    Empty,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub file_name: String,
    pub kind: String,
    pub characters: usize,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub documents: Vec<DocumentSummary>,
    pub chunks: usize,
    pub backend: &'static str,
}

pub struct KnowledgeBase {
    pub qa: RetrievalQA,
    pub stats: IndexStats,
}

pub struct KnowledgeBaseBuilder {
    processor: DocumentProcessor,
    splitter: RecursiveCharacterTextSplitter,
    embeddings: EmbeddingGenerator,
    retriever_k: usize,
}

impl KnowledgeBaseBuilder {
    pub fn new(
        processor: DocumentProcessor,
        splitter: RecursiveCharacterTextSplitter,
        embeddings: EmbeddingGenerator,
        retriever_k: usize,
    ) -> Self {
        Self {
            processor,
            splitter,
            embeddings,
            retriever_k,
        }
    }

    pub fn from_config(config: &AppConfig, provider: Arc<dyn CompletionProvider>) -> Result<Self, KnowledgeBaseError> {
        Ok(Self::new(
            DocumentProcessor::new(OcrPipeline::from_config(&config.ocr)),
            RecursiveCharacterTextSplitter::new(config.chunk_size, config.chunk_overlap)?,
            EmbeddingGenerator::new(provider, config.embedding_batch_size),
            config.retriever_k,
        ))
    }

    /// Loads, splits and embeds every document, filling `store`.
    pub async fn build(
        &self,
        folder: &Path,
        provider: Arc<dyn CompletionProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Result<KnowledgeBase, KnowledgeBaseError> {
        let documents = self.processor.load_folder(folder).await?;
        let full_text = combine_documents(&documents);

        let chunks = self.splitter.split_text(&full_text);
        info!("Generated {} text chunks.", chunks.len());
        if chunks.is_empty() {
            return Err(KnowledgeBaseError::Empty);
        }

        let vectors = self
            .embeddings
            .generate_batch_embeddings(&chunks)
            .await
            .map_err(|e| KnowledgeBaseError::Embedding(e.to_string()))?;

        let chunk_count = chunks.len();
        store.add(chunks, vectors).await?;
        info!("Vector store created ({}, {} chunks)", store.backend(), chunk_count);

        let stats = IndexStats {
            documents: documents
                .iter()
                .map(|doc| DocumentSummary {
                    file_name: doc.file_name.clone(),
                    kind: doc.kind.to_string(),
                    characters: doc.text.chars().count(),
                    language: doc.language.clone(),
                })
                .collect(),
            chunks: chunk_count,
            backend: store.backend(),
        };

        Ok(KnowledgeBase {
            qa: RetrievalQA::new(provider, self.embeddings.clone(), store, self.retriever_k),
            stats,
        })
    }
}

/// Qdrant when a URL is configured, otherwise an in-process index.
pub async fn open_vector_store(config: &AppConfig) -> Result<Arc<dyn VectorStore>, KnowledgeBaseError> {
    match &config.qdrant_url {
        Some(url) => {
            let store = QdrantVectorStore::connect(url, &config.qdrant_collection).await?;
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(InMemoryVectorStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ocr::tests::fake_pipeline;
    use crate::providers::mock::MockProvider;

    fn builder(provider: Arc<MockProvider>, ocr_pages: &[&str], chunk_size: usize) -> KnowledgeBaseBuilder {
        KnowledgeBaseBuilder::new(
            DocumentProcessor::new(fake_pipeline(ocr_pages)),
            RecursiveCharacterTextSplitter::new(chunk_size, 10).unwrap(),
            EmbeddingGenerator::new(provider, 4),
            2,
        )
    }

    #[tokio::test]
    async fn test_build_indexes_every_chunk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scan.pdf"), b"%PDF-1.4\nbroken").unwrap();

        let provider = Arc::new(MockProvider::replying("उत्तर"));
        let page = "गंगा नदी हिमालय से निकलती है। ".repeat(10);
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());

        let kb = builder(provider.clone(), &[&page], 60)
            .build(dir.path(), provider.clone(), store.clone())
            .await
            .unwrap();

        assert!(kb.stats.chunks > 1);
        assert_eq!(store.len().await.unwrap(), kb.stats.chunks);
        assert_eq!(kb.stats.documents.len(), 1);
        assert_eq!(kb.stats.documents[0].file_name, "scan.pdf");
        assert_eq!(kb.stats.backend, "memory");

        let answer = kb.qa.run("गंगा नदी").await.unwrap();
        assert_eq!(answer, "उत्तर");
    }

    #[tokio::test]
    async fn test_build_fails_without_documents() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::replying(""));
        let err = builder(provider.clone(), &[], 60)
            .build(dir.path(), provider, Arc::new(InMemoryVectorStore::new()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, KnowledgeBaseError::Document(DocumentError::NoContent)));
    }
}
