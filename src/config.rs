use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("OpenAI API key is missing! Check your .env file.")]
    MissingApiKey,
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub api_base: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub language: String,
    pub tessdata: Option<String>,
    pub pdftoppm: String,
    pub dpi: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub ocr: OcrConfig,
    pub data_folder: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub retriever_k: usize,
    pub embedding_batch_size: usize,
    pub qdrant_url: Option<String>,
    pub qdrant_collection: String,
    pub database_path: PathBuf,
    pub answer_cache_size: usize,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Reads the configuration from the process environment. `.env` must
    /// already have been loaded by the caller.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::MissingApiKey)?;

        let provider = ProviderConfig {
            api_key,
            api_base: get("OPENAI_API_BASE"),
            chat_model: get("OPENAI_CHAT_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
            embedding_model: get("OPENAI_EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-ada-002".to_string()),
            temperature: parse_or(&get, "OPENAI_TEMPERATURE", 0.7)?,
        };

        let ocr = OcrConfig {
            language: get("OCR_LANGUAGE").unwrap_or_else(|| "hin".to_string()),
            tessdata: get("TESSDATA_PREFIX"),
            pdftoppm: get("PDFTOPPM_PATH").unwrap_or_else(|| "pdftoppm".to_string()),
            dpi: parse_or(&get, "OCR_DPI", 200)?,
        };

        let chunk_size: usize = parse_or(&get, "CHUNK_SIZE", 500)?;
        let chunk_overlap: usize = parse_or(&get, "CHUNK_OVERLAP", 50)?;
        if chunk_size == 0 {
            return Err(ConfigError::Invalid {
                key: "CHUNK_SIZE".to_string(),
                value: "0".to_string(),
            });
        }
        if chunk_overlap >= chunk_size {
            return Err(ConfigError::Invalid {
                key: "CHUNK_OVERLAP".to_string(),
                value: format!("{} (chunk size {})", chunk_overlap, chunk_size),
            });
        }

        let retriever_k: usize = parse_or(&get, "RETRIEVER_K", 4)?;
        if retriever_k == 0 {
            return Err(ConfigError::Invalid {
                key: "RETRIEVER_K".to_string(),
                value: "0".to_string(),
            });
        }

        let embedding_batch_size: usize = parse_or(&get, "EMBEDDING_BATCH_SIZE", 1000)?;
        if embedding_batch_size == 0 {
            return Err(ConfigError::Invalid {
                key: "EMBEDDING_BATCH_SIZE".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(Self {
            provider,
            ocr,
            data_folder: get("DATA_FOLDER")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data_files").join("documents")),
            chunk_size,
            chunk_overlap,
            retriever_k,
            embedding_batch_size,
            qdrant_url: get("QDRANT_URL"),
            qdrant_collection: get("QDRANT_COLLECTION").unwrap_or_else(|| "documents".to_string()),
            database_path: get("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data").join("conversations.db")),
            answer_cache_size: parse_or(&get, "ANSWER_CACHE_SIZE", 100)?,
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&get, "PORT", 5000)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
