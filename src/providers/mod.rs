pub mod openai;
pub mod traits;
pub mod utils;

#[cfg(test)]
pub mod mock;

pub use openai::OpenAIProvider;
pub use traits::CompletionProvider;
