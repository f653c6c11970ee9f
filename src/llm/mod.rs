pub mod assistant;
pub mod embeddings;
pub mod qa;

pub use assistant::Assistant;
pub use embeddings::EmbeddingGenerator;
pub use qa::RetrievalQA;
