use docx_lite::Paragraph;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use serde::Serialize;
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{DocumentError, OcrPipeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Extension matching is case-sensitive: `report.PDF` is not picked up.
    pub fn from_file_name(name: &str) -> Option<Self> {
        if name.ends_with(".pdf") {
            Some(Self::Pdf)
        } else if name.ends_with(".docx") {
            Some(Self::Docx)
        } else {
            None
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => write!(f, "PDF"),
            Self::Docx => write!(f, "DOCX"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadedDocument {
    pub file_name: String,
    pub kind: DocumentKind,
    pub text: String,
    /// Detected language of the text, informational only.
    pub language: Option<String>,
}

/// Extracts the text of a PDF, falling back to OCR when it has no text layer.
pub async fn extract_text_from_pdf(path: &Path, ocr: &OcrPipeline) -> Result<String, DocumentError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DocumentError::io(path, e))?;

    // pdf-extract can panic on malformed input, keep it off the async workers
    let extracted = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| format!("{:?}", e))
    })
    .await;

    let mut text = match extracted {
        Ok(Ok(pages)) => join_text_layer(&pages),
        Ok(Err(message)) => {
            warn!("Text layer of {} unreadable: {}", path.display(), message);
            String::new()
        }
        Err(e) => {
            warn!("Text layer extraction of {} aborted: {}", path.display(), e);
            String::new()
        }
    };

    if text.trim().is_empty() {
        info!("No direct text found in {}, using OCR...", path.display());
        text.push_str(&ocr.ocr_pdf(path).await?);
    }

    Ok(text.trim().to_string())
}

fn join_text_layer(pages: &[String]) -> String {
    let mut text = String::new();
    for page in pages.iter().filter(|page| !page.is_empty()) {
        text.push_str(page);
        text.push('\n');
    }
    text
}

/// Body paragraphs only; table cells, headers and notes are left out.
pub async fn extract_text_from_docx(path: &Path) -> Result<String, DocumentError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DocumentError::io(path, e))?;

    let document = docx_lite::parse_document(Cursor::new(bytes)).map_err(|e| DocumentError::Docx {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(non_empty_paragraphs(document.paragraphs.iter().map(Paragraph::to_text)))
}

/// Keeps paragraphs that contain something other than whitespace.
fn non_empty_paragraphs<I>(paragraphs: I) -> String
where
    I: IntoIterator<Item = String>,
{
    paragraphs
        .into_iter()
        .filter(|paragraph| !paragraph.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

pub fn combine_documents(documents: &[LoadedDocument]) -> String {
    documents
        .iter()
        .map(|doc| doc.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn detect_language(text: &str) -> Option<String> {
    whatlang::detect(text).map(|info| info.lang().eng_name().to_string())
}

pub struct DocumentProcessor {
    ocr: OcrPipeline,
}

impl DocumentProcessor {
    pub fn new(ocr: OcrPipeline) -> Self {
        Self { ocr }
    }

    pub async fn extract(&self, path: &Path, kind: DocumentKind) -> Result<String, DocumentError> {
        match kind {
            DocumentKind::Pdf => extract_text_from_pdf(path, &self.ocr).await,
            DocumentKind::Docx => extract_text_from_docx(path).await,
        }
    }

    /// Reads every PDF and DOCX directly inside `folder`, in file name order.
    pub async fn load_folder(&self, folder: &Path) -> Result<Vec<LoadedDocument>, DocumentError> {
        if !tokio::fs::try_exists(folder).await.unwrap_or(false) {
            return Err(DocumentError::FolderNotFound(folder.to_path_buf()));
        }

        let files = list_documents(folder).await?;

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(120));

        let mut documents = Vec::new();
        for (file_name, kind, path) in files {
            pb.set_message(format!("Reading {}", file_name));
            let text = match self.extract(&path, kind).await {
                Ok(text) => text,
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e);
                }
            };

            if text.is_empty() {
                warn!("Skipping {}: no text extracted", file_name);
                continue;
            }

            info!("Loaded {}: {}", kind, file_name);
            documents.push(LoadedDocument {
                file_name,
                kind,
                language: detect_language(&text),
                text,
            });
        }
        pb.finish_and_clear();

        if documents.is_empty() {
            return Err(DocumentError::NoContent);
        }

        info!("All PDFs & DOCX files loaded successfully!");
        Ok(documents)
    }
}

async fn list_documents(folder: &Path) -> Result<Vec<(String, DocumentKind, PathBuf)>, DocumentError> {
    let mut entries = tokio::fs::read_dir(folder)
        .await
        .map_err(|e| DocumentError::io(folder, e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DocumentError::io(folder, e))?
    {
        let file_name = entry.file_name().to_string_lossy().to_string();
        let Some(kind) = DocumentKind::from_file_name(&file_name) else {
            continue;
        };
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if is_file {
            files.push((file_name, kind, entry.path()));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ocr::tests::fake_pipeline;
    use std::io::Write;

    #[test]
    fn test_kind_from_file_name() {
        assert_eq!(DocumentKind::from_file_name("a.pdf"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_file_name("notes.docx"), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_file_name("scan.PDF"), None);
        assert_eq!(DocumentKind::from_file_name("old.doc"), None);
        assert_eq!(DocumentKind::from_file_name("readme.txt"), None);
    }

    #[test]
    fn test_join_text_layer_skips_empty_pages() {
        let pages = vec!["one".to_string(), String::new(), "three".to_string()];
        assert_eq!(join_text_layer(&pages), "one\nthree\n");
        assert_eq!(join_text_layer(&[]), "");
    }

    #[test]
    fn test_non_empty_paragraphs() {
        let paragraphs = ["पहला अनुच्छेद", "   ", "", "दूसरा अनुच्छेद"].map(String::from);
        assert_eq!(non_empty_paragraphs(paragraphs), "पहला अनुच्छेद\nदूसरा अनुच्छेद");
        assert_eq!(non_empty_paragraphs(["\n ".to_string()]), "");
    }

    const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    fn paragraph_xml(text: &str) -> String {
        format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", text)
    }

    /// Packs `body` into the smallest archive the DOCX reader accepts.
    fn write_docx(path: &Path, body: &str) {
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
            <w:document xmlns:w=\"{}\"><w:body>{}</w:body></w:document>",
            WORD_NS, body
        );
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/document.xml", zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        std::fs::write(path, bytes).unwrap();
    }

    /// A one page PDF whose text is drawn in Helvetica, with a correct xref table.
    fn text_layer_pdf(text: &str) -> Vec<u8> {
        let content = format!("BT /F1 24 Tf 72 720 Td ({}) Tj ET", text);
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
             /Resources << /Font << /F1 5 0 R >> >> >>"
                .to_string(),
            format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string(),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref = pdf.len();
        let mut tail = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            tail.push_str(&format!("{:010} 00000 n \n", offset));
        }
        tail.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        ));
        pdf.extend_from_slice(tail.as_bytes());
        pdf
    }

    #[tokio::test]
    async fn test_docx_keeps_body_paragraphs_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.docx");
        let table = "<w:tbl><w:tr>\
            <w:tc><w:p><w:r><w:t>CellA</w:t></w:r></w:p></w:tc>\
            <w:tc><w:p><w:r><w:t>CellB</w:t></w:r></w:p></w:tc>\
            </w:tr></w:tbl>";
        let body = format!(
            "{}{}{}{}",
            paragraph_xml("Para one"),
            paragraph_xml("   "),
            table,
            paragraph_xml("Para two")
        );
        write_docx(&path, &body);

        let text = extract_text_from_docx(&path).await.unwrap();
        assert_eq!(text, "Para one\nPara two");
    }

    #[tokio::test]
    async fn test_invalid_docx_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"not a zip archive").unwrap();

        let err = extract_text_from_docx(&path).await.unwrap_err();
        assert!(matches!(err, DocumentError::Docx { .. }));
    }

    #[tokio::test]
    async fn test_text_layer_pdf_skips_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, text_layer_pdf("Ganga river")).unwrap();

        let text = extract_text_from_pdf(&path, &fake_pipeline(&["FROM OCR"]))
            .await
            .unwrap();
        assert!(text.contains("Ganga"), "unexpected text layer: {:?}", text);
        assert!(!text.contains("FROM OCR"));
    }

    #[test]
    fn test_combine_documents() {
        let doc = |text: &str| LoadedDocument {
            file_name: "x.pdf".to_string(),
            kind: DocumentKind::Pdf,
            text: text.to_string(),
            language: None,
        };
        assert_eq!(combine_documents(&[doc("a"), doc("b")]), "a\nb");
    }

    #[tokio::test]
    async fn test_unreadable_pdf_falls_back_to_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, b"%PDF-1.4\nnot really a pdf").unwrap();

        let text = extract_text_from_pdf(&path, &fake_pipeline(&["  स्कैन किया गया पाठ  "]))
            .await
            .unwrap();
        assert_eq!(text, "स्कैन किया गया पाठ");
    }

    #[tokio::test]
    async fn test_missing_folder() {
        let processor = DocumentProcessor::new(fake_pipeline(&[]));
        let err = processor
            .load_folder(Path::new("/definitely/not/here"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::FolderNotFound(_)));
    }

    #[tokio::test]
    async fn test_folder_without_documents_has_no_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(dir.path().join("upper.PDF"), "ignored").unwrap();

        let processor = DocumentProcessor::new(fake_pipeline(&["text"]));
        let err = processor.load_folder(dir.path()).await.unwrap_err();
        assert!(matches!(err, DocumentError::NoContent));
    }

    #[tokio::test]
    async fn test_load_folder_uses_ocr_and_skips_blank_scans() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"%PDF-1.4\nbroken").unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"%PDF-1.4\nbroken").unwrap();
        std::fs::create_dir(dir.path().join("folder.pdf")).unwrap();

        let processor = DocumentProcessor::new(fake_pipeline(&["भारत की राजधानी नई दिल्ली है।"]));
        let documents = processor.load_folder(dir.path()).await.unwrap();
        let names: Vec<_> = documents.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
        assert!(documents.iter().all(|d| d.kind == DocumentKind::Pdf));
        assert_eq!(documents[0].text, "भारत की राजधानी नई दिल्ली है।");

        let blank = DocumentProcessor::new(fake_pipeline(&["   "]));
        let err = blank.load_folder(dir.path()).await.unwrap_err();
        assert!(matches!(err, DocumentError::NoContent));
    }

    #[tokio::test]
    async fn test_load_folder_reads_docx_and_pdf() {
        let dir = tempfile::tempdir().unwrap();
        write_docx(
            &dir.path().join("a_notes.docx"),
            &format!("{}{}", paragraph_xml("गंगा भारत की सबसे लंबी नदी है।"), paragraph_xml("")),
        );
        std::fs::write(dir.path().join("b_report.pdf"), text_layer_pdf("Ganga river")).unwrap();

        let processor = DocumentProcessor::new(fake_pipeline(&["FROM OCR"]));
        let documents = processor.load_folder(dir.path()).await.unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].file_name, "a_notes.docx");
        assert_eq!(documents[0].kind, DocumentKind::Docx);
        assert_eq!(documents[0].text, "गंगा भारत की सबसे लंबी नदी है।");
        assert_eq!(documents[1].kind, DocumentKind::Pdf);
        assert!(documents[1].text.contains("Ganga"));
    }
}
