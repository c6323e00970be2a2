// Résumé intake: multipart uploads and plain-text extraction from PDF/DOCX/TXT.

pub mod extractor;
pub mod handlers;
pub mod upload;
