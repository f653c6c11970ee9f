pub mod vector_db;
pub mod database;
pub mod qdrant_config;
pub mod qdrant_store;

pub use database::{ConversationRecord, Database, DatabaseError};
pub use qdrant_store::QdrantVectorStore;
pub use vector_db::{InMemoryVectorStore, ScoredChunk, VectorDBError, VectorStore};
