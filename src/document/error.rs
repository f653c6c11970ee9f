use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Folder not found: {0}")]
    FolderNotFound(PathBuf),
    #[error("No valid content found in the PDFs or DOCX files.")]
    NoContent,
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("PDF extraction failed for {path}: {message}")]
    Pdf { path: PathBuf, message: String },
    #[error("DOCX extraction failed for {path}: {message}")]
    Docx { path: PathBuf, message: String },
    #[error("Rasterising {path} failed: {message}")]
    Rasterize { path: PathBuf, message: String },
    #[error("OCR failed: {0}")]
    Ocr(String),
    #[error("Invalid splitter settings: chunk overlap {overlap} is larger than chunk size {size}")]
    InvalidSplitter { size: usize, overlap: usize },
}

impl DocumentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
