//! Document Extractor: plain text out of PDF, DOCX and TXT résumé files.
//!
//! Extraction is synchronous and CPU-bound; async callers run it on the blocking pool.

use std::fmt;
use std::fs::{self, File};
use std::io::Read;
use std::panic;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::{debug, info};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Location of the main body part inside a DOCX package.
const DOCX_BODY_PART: &str = "word/document.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
}

impl DocumentFormat {
    /// Picks the format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            "txt" => Some(DocumentFormat::Txt),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Docx => "DOCX",
            DocumentFormat::Txt => "TXT",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("unsupported file type '{0}', expected .pdf, .docx or .txt")]
    UnsupportedFormat(String),

    #[error("error reading {format}: {source}")]
    ExtractionFailed {
        format: DocumentFormat,
        #[source]
        source: BoxError,
    },
}

impl ExtractError {
    fn failed(format: DocumentFormat, source: impl Into<BoxError>) -> Self {
        ExtractError::ExtractionFailed {
            format,
            source: source.into(),
        }
    }
}

/// Extracts the plain text of a résumé file.
///
/// The existence check comes first; the extension decides the format before any read.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::FileNotFound(path.to_path_buf()));
    }

    let format = DocumentFormat::from_path(path).ok_or_else(|| {
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        ExtractError::UnsupportedFormat(extension)
    })?;

    debug!("Extracting {} text from {}", format, path.display());
    let text = match format {
        DocumentFormat::Pdf => extract_pdf(path),
        DocumentFormat::Docx => extract_docx(path),
        DocumentFormat::Txt => extract_txt(path),
    }?;

    info!("Extracted {} characters of {} text", text.chars().count(), format);
    Ok(text)
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    let format = DocumentFormat::Pdf;
    let bytes = fs::read(path).map_err(|e| ExtractError::failed(format, e))?;

    // pdf-extract panics on some malformed inputs instead of returning an error.
    let pages = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(&bytes))
        .map_err(|_| ExtractError::failed(format, "PDF parser aborted on malformed input"))?
        .map_err(|e| ExtractError::failed(format, e.to_string()))?;

    let total = pages.len();
    let text_pages: Vec<&str> = pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect();
    if text_pages.len() < total {
        debug!(
            "Skipped {} of {} PDF pages without extractable text",
            total - text_pages.len(),
            total
        );
    }

    Ok(text_pages.join("\n"))
}

fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let format = DocumentFormat::Docx;
    let file = File::open(path).map_err(|e| ExtractError::failed(format, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ExtractError::failed(format, e))?;

    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY_PART)
        .map_err(|e| ExtractError::failed(format, e))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::failed(format, e))?;

    let paragraphs = docx_paragraphs(&xml).map_err(|e| ExtractError::failed(format, e))?;
    Ok(paragraphs.join("\n").trim().to_string())
}

/// Paragraph texts of a WordprocessingML body, in document order.
fn docx_paragraphs(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => current.clear(),
                b"w:t" => in_text_run = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_text_run => current.push_str(&t.unescape()?),
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn extract_txt(path: &Path) -> Result<String, ExtractError> {
    let text = fs::read_to_string(path).map_err(|e| ExtractError::failed(DocumentFormat::Txt, e))?;
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};
    use zip::write::SimpleFileOptions;

    fn temp_file(suffix: &str, contents: &[u8]) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    fn docx_with_body(body: &str) -> NamedTempFile {
        let file = Builder::new().suffix(".docx").tempfile().unwrap();
        let mut zip = zip::ZipWriter::new(file.reopen().unwrap());
        zip.start_file(DOCX_BODY_PART, SimpleFileOptions::default())
            .unwrap();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
        file
    }

    #[test]
    fn test_missing_file_is_file_not_found() {
        let err = extract_text(Path::new("/definitely/not/here/resume.pdf")).unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound(_)));
    }

    #[test]
    fn test_missing_file_wins_over_unsupported_extension() {
        let err = extract_text(Path::new("/definitely/not/here/resume.csv")).unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound(_)));
    }

    #[test]
    fn test_csv_is_unsupported_format() {
        let file = temp_file(".csv", b"name,skill\nAda,Rust\n");
        match extract_text(file.path()).unwrap_err() {
            ExtractError::UnsupportedFormat(ext) => assert_eq!(ext, ".csv"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_file_without_extension_is_unsupported() {
        let file = temp_file("", b"text");
        assert!(matches!(
            extract_text(file.path()).unwrap_err(),
            ExtractError::UnsupportedFormat(_)
        ));
    }

    #[test]
    fn test_txt_is_read_whole_and_trimmed() {
        let file = temp_file(".txt", "\n  Ada Lovelace\nAnalytical Engines  \n\n".as_bytes());
        assert_eq!(
            extract_text(file.path()).unwrap(),
            "Ada Lovelace\nAnalytical Engines"
        );
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let file = temp_file(".TXT", b"Shouting extension");
        assert_eq!(extract_text(file.path()).unwrap(), "Shouting extension");
        assert_eq!(
            DocumentFormat::from_path(Path::new("CV.Docx")),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("cv.PDF")),
            Some(DocumentFormat::Pdf)
        );
    }

    #[test]
    fn test_invalid_utf8_txt_is_extraction_failed() {
        let file = temp_file(".txt", &[0xff, 0xfe, 0xfd]);
        assert!(matches!(
            extract_text(file.path()).unwrap_err(),
            ExtractError::ExtractionFailed {
                format: DocumentFormat::Txt,
                ..
            }
        ));
    }

    #[test]
    fn test_docx_paragraphs_one_per_line() {
        let file = docx_with_body(
            r#"<w:p><w:r><w:t>Ada Lovelace</w:t></w:r></w:p><w:p><w:r><w:t xml:space="preserve">Skills: </w:t></w:r><w:r><w:t>Rust &amp; SQL</w:t></w:r></w:p><w:p/><w:p><w:r><w:t>Figma</w:t><w:tab/><w:t>UX</w:t></w:r></w:p>"#,
        );
        assert_eq!(
            extract_text(file.path()).unwrap(),
            "Ada Lovelace\nSkills: Rust & SQL\n\nFigma\tUX"
        );
    }

    #[test]
    fn test_docx_without_body_part_is_extraction_failed() {
        let file = Builder::new().suffix(".docx").tempfile().unwrap();
        let mut zip = zip::ZipWriter::new(file.reopen().unwrap());
        zip.start_file("other.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<x/>").unwrap();
        zip.finish().unwrap();

        let err = extract_text(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::ExtractionFailed {
                format: DocumentFormat::Docx,
                ..
            }
        ));
    }

    #[test]
    fn test_non_zip_docx_is_extraction_failed() {
        let file = temp_file(".docx", b"plain text pretending to be a docx");
        assert!(matches!(
            extract_text(file.path()).unwrap_err(),
            ExtractError::ExtractionFailed { .. }
        ));
    }

    #[test]
    fn test_corrupt_pdf_is_extraction_failed() {
        let file = temp_file(".pdf", b"this is not a pdf");
        let err = extract_text(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::ExtractionFailed {
                format: DocumentFormat::Pdf,
                ..
            }
        ));
        assert!(err.to_string().starts_with("error reading PDF"));
    }
}
