mod error;
pub mod ocr;
mod processor;
pub mod splitter;

pub use error::DocumentError;
pub use ocr::{OcrPipeline, PageRasterizer, PdftoppmRasterizer, TesseractRecognizer, TextRecognizer};
pub use processor::{
    combine_documents, extract_text_from_docx, extract_text_from_pdf, DocumentKind,
    DocumentProcessor, LoadedDocument,
};
pub use splitter::RecursiveCharacterTextSplitter;
