//! Upload checks and plain-text extraction for resume files.
//!
//! PDF goes through `pdf-extract`, Word documents through the
//! `word/document.xml` part of the archive, everything else is read as UTF-8.

use std::io::{Cursor, Read};
use std::path::Path;

use bytes::Bytes;
use quick_xml::{events::Event, Reader as XmlReader};
use thiserror::Error;
use zip::ZipArchive;

use crate::errors::AppError;

pub const MAX_FILE_NAME_CHARS: usize = 255;

pub const ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".doc", ".docx", ".txt"];

pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No file uploaded. Please select a file.")]
    Missing,

    #[error("File name too long. Maximum {MAX_FILE_NAME_CHARS} characters allowed.")]
    FileNameTooLong,

    #[error("Invalid file name format.")]
    UnsafeFileName,

    #[error("Invalid file extension '{0}'. Allowed extensions: .pdf, .doc, .docx, .txt")]
    UnsupportedExtension(String),

    #[error("Invalid file type '{0}'.")]
    UnsupportedContentType(String),

    #[error("Cannot upload empty file.")]
    Empty,

    #[error("File size exceeds limit of {limit_mb}MB.")]
    TooLarge { limit_mb: usize },

    #[error("Could not read PDF: {0}")]
    Pdf(String),

    #[error("Could not read Word document: {0}")]
    Docx(String),

    #[error("Could not extract text from file. Please ensure the file contains readable text.")]
    NoText,
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::TooLarge { .. } => AppError::PayloadTooLarge(e.to_string()),
            other => AppError::Validation(other.to_string()),
        }
    }
}

/// A file received from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Lowercased extension including the dot, or "" when there is none.
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default()
    }

    /// File name with whitespace runs replaced by `_`.
    pub fn sanitized_name(&self) -> String {
        self.file_name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Checks name, type and size before anything is parsed or stored.
pub fn validate_upload(file: &UploadedFile, max_bytes: usize) -> Result<(), ExtractError> {
    let essence = file.content_type.split(';').next().unwrap_or_default().trim();
    if !ALLOWED_CONTENT_TYPES.contains(&essence) {
        return Err(ExtractError::UnsupportedContentType(file.content_type.clone()));
    }

    let extension = file.extension();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ExtractError::UnsupportedExtension(extension));
    }

    if file.file_name.chars().count() > MAX_FILE_NAME_CHARS {
        return Err(ExtractError::FileNameTooLong);
    }

    let name = &file.file_name;
    if name.contains("../") || name.starts_with('/') || name.contains('\\') || name.contains('\0') {
        return Err(ExtractError::UnsafeFileName);
    }

    if file.bytes.is_empty() {
        return Err(ExtractError::Empty);
    }

    if file.bytes.len() > max_bytes {
        return Err(ExtractError::TooLarge {
            limit_mb: (max_bytes + (1 << 19)) >> 20,
        });
    }

    Ok(())
}

/// Extracts plain text by extension. Blank output is `NoText`.
pub fn extract_text(file: &UploadedFile) -> Result<String, ExtractError> {
    let text = match file.extension().as_str() {
        ".pdf" => pdf_extract::extract_text_from_mem(&file.bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?,
        ".docx" | ".doc" => extract_docx_text(&file.bytes)?,
        _ => String::from_utf8_lossy(&file.bytes).into_owned(),
    };

    if text.trim().is_empty() {
        return Err(ExtractError::NoText);
    }
    Ok(text)
}

fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Docx(format!("missing word/document.xml: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut reader = XmlReader::from_str(&xml);
    let mut buf = Vec::new();
    let mut output = String::new();
    let mut in_text_node = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"w:t" => in_text_node = true,
                b"w:tab" => output.push('\t'),
                b"w:br" => output.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"w:tab" => output.push('\t'),
                b"w:br" => output.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text_node {
                    let value = e
                        .unescape()
                        .map_err(|err| ExtractError::Docx(err.to_string()))?;
                    output.push_str(&value);
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => in_text_node = false,
                b"w:p" => output.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => return Err(ExtractError::Docx(format!("failed to parse XML: {err}"))),
            _ => {}
        }
        buf.clear();
    }

    Ok(output.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MB: usize = 1024 * 1024;

    fn file(name: &str, content_type: &str, bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: Bytes::copy_from_slice(bytes),
        }
    }

    fn docx_with(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_accepts_plain_text_resume() {
        let upload = file("cv.txt", "text/plain", b"Rust developer");
        assert!(validate_upload(&upload, 5 * MB).is_ok());
        assert_eq!(extract_text(&upload).unwrap(), "Rust developer");
    }

    #[test]
    fn test_rejects_wrong_content_type() {
        let upload = file("cv.txt", "image/png", b"x");
        assert!(matches!(
            validate_upload(&upload, MB),
            Err(ExtractError::UnsupportedContentType(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_extension() {
        let upload = file("cv.exe", "application/pdf", b"x");
        let err = validate_upload(&upload, MB).unwrap_err();
        assert!(err.to_string().contains(".exe"));
    }

    #[test]
    fn test_rejects_dangerous_names() {
        for name in ["../etc/cv.pdf", "/abs/cv.pdf", "dir\\cv.pdf", "cv\0.pdf"] {
            let upload = file(name, "application/pdf", b"x");
            assert!(
                matches!(validate_upload(&upload, MB), Err(ExtractError::UnsafeFileName)),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_long_names() {
        let name = format!("{}.pdf", "a".repeat(300));
        let upload = file(&name, "application/pdf", b"x");
        assert!(matches!(
            validate_upload(&upload, MB),
            Err(ExtractError::FileNameTooLong)
        ));
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        assert!(matches!(
            validate_upload(&file("cv.txt", "text/plain", b""), MB),
            Err(ExtractError::Empty)
        ));

        let big = vec![b'a'; MB + 1];
        let err = validate_upload(&file("cv.txt", "text/plain", &big), MB).unwrap_err();
        assert!(matches!(err, ExtractError::TooLarge { limit_mb: 1 }));
        assert!(matches!(AppError::from(err), AppError::PayloadTooLarge(_)));
    }

    #[test]
    fn test_sanitized_name_replaces_spaces() {
        let upload = file("My  Resume 2024.PDF", "application/pdf", b"x");
        assert_eq!(upload.sanitized_name(), "My_Resume_2024.PDF");
        assert_eq!(upload.extension(), ".pdf");
    }

    #[test]
    fn test_blank_text_is_rejected() {
        let upload = file("cv.txt", "text/plain", b"  \n\t ");
        assert!(matches!(extract_text(&upload), Err(ExtractError::NoText)));
    }

    #[test]
    fn test_docx_text_extracted() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Senior Engineer</w:t></w:r></w:p>
    <w:p><w:r><w:t>Rust</w:t><w:tab/><w:t>Go &amp; Python</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let upload = file(
            "cv.docx",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            &docx_with(xml),
        );

        let text = extract_text(&upload).unwrap();
        assert!(text.contains("Senior Engineer"));
        assert!(text.contains("Rust\tGo & Python"));
    }

    #[test]
    fn test_non_zip_word_file_is_an_error() {
        let upload = file("cv.doc", "application/msword", b"\xD0\xCF\x11\xE0 legacy");
        assert!(matches!(extract_text(&upload), Err(ExtractError::Docx(_))));
    }

    #[test]
    fn test_invalid_pdf_is_an_error() {
        let upload = file("cv.pdf", "application/pdf", b"definitely not a pdf");
        assert!(matches!(extract_text(&upload), Err(ExtractError::Pdf(_))));
    }
}
