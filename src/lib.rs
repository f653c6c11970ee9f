pub mod api;
pub mod commands;
pub mod config;
pub mod database;
pub mod document;
pub mod knowledge_base;
pub mod llm;
pub mod providers;

pub use config::AppConfig;
pub use knowledge_base::{KnowledgeBase, KnowledgeBaseBuilder};
pub use llm::Assistant;
