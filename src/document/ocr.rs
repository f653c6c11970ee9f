use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tesseract::Tesseract;
use tokio::process::Command;

use super::DocumentError;
use crate::config::OcrConfig;

/// Renders every page of a PDF to an image file inside `out_dir`.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Returns the page images in page order.
    async fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, DocumentError>;
}

/// Reads the text printed on a single page image.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &Path) -> Result<String, DocumentError>;
}

/// Shells out to poppler's `pdftoppm`.
pub struct PdftoppmRasterizer {
    binary: String,
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(binary: impl Into<String>, dpi: u32) -> Self {
        Self { binary: binary.into(), dpi }
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, DocumentError> {
        let output = Command::new(&self.binary)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(out_dir.join("page"))
            .output()
            .await
            .map_err(|e| DocumentError::Rasterize {
                path: pdf.to_path_buf(),
                message: format!("could not run {}: {}", self.binary, e),
            })?;

        if !output.status.success() {
            return Err(DocumentError::Rasterize {
                path: pdf.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        collect_page_images(out_dir).await
    }
}

/// pdftoppm zero-pads page numbers to a common width, so name order is page order.
async fn collect_page_images(dir: &Path) -> Result<Vec<PathBuf>, DocumentError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| DocumentError::io(dir, e))?;

    let mut images = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DocumentError::io(dir, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("png") {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

pub struct TesseractRecognizer {
    language: String,
    tessdata: Option<String>,
}

impl TesseractRecognizer {
    pub fn new(language: impl Into<String>, tessdata: Option<String>) -> Self {
        Self { language: language.into(), tessdata }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &Path) -> Result<String, DocumentError> {
        let image = image
            .to_str()
            .ok_or_else(|| DocumentError::Ocr(format!("non UTF-8 path: {}", image.display())))?;

        let mut tesseract = Tesseract::new(self.tessdata.as_deref(), Some(self.language.as_str()))
            .map_err(|e| DocumentError::Ocr(e.to_string()))?
            .set_image(image)
            .map_err(|e| DocumentError::Ocr(e.to_string()))?;

        tesseract
            .get_text()
            .map_err(|e| DocumentError::Ocr(e.to_string()))
    }
}

#[derive(Clone)]
pub struct OcrPipeline {
    rasterizer: Arc<dyn PageRasterizer>,
    recognizer: Arc<dyn TextRecognizer>,
}

impl OcrPipeline {
    pub fn new(rasterizer: Arc<dyn PageRasterizer>, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self { rasterizer, recognizer }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(
            Arc::new(PdftoppmRasterizer::new(config.pdftoppm.clone(), config.dpi)),
            Arc::new(TesseractRecognizer::new(config.language.clone(), config.tessdata.clone())),
        )
    }

    /// Rasterises the PDF and recognises each page, one line break after every page.
    pub async fn ocr_pdf(&self, pdf: &Path) -> Result<String, DocumentError> {
        let workdir = tempfile::tempdir().map_err(|e| DocumentError::io(pdf, e))?;
        let pages = self.rasterizer.rasterize(pdf, workdir.path()).await?;
        log::debug!("Rasterised {} pages from {}", pages.len(), pdf.display());

        let mut text = String::new();
        for page in pages {
            let recognizer = Arc::clone(&self.recognizer);
            let page_text = tokio::task::spawn_blocking(move || recognizer.recognize(&page))
                .await
                .map_err(|e| DocumentError::Ocr(format!("OCR task failed: {}", e)))??;
            text.push_str(&page_text);
            text.push('\n');
        }
        Ok(text)
    }
}
