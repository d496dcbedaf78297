//! Plain-text extraction from downloaded file bytes.
//!
//! Order of attempts: textual MIME type, known text extension, PDF, DOCX,
//! then a best-effort decode of whatever is left.

use std::io::{Cursor, Read};

use quick_xml::Reader as XmlReader;
use quick_xml::events::Event;
use tracing::debug;
use zip::ZipArchive;

const PDF_MIME: &str = "application/pdf";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const DOCX_BODY_PATH: &str = "word/document.xml";

const TEXTUAL_MIMES: &[&str] = &[
    "application/json",
    "application/xml",
    "application/x-yaml",
    "application/yaml",
    "application/javascript",
    "application/x-javascript",
    "application/csv",
    "application/sql",
];

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "csv", "tsv", "json", "xml", "yaml", "yml", "log", "py", "js", "ts", "java",
    "cpp", "h", "swift", "sql", "html", "css",
];

/// Extract readable text, or `None` when nothing readable came out.
pub fn extract_text(bytes: &[u8], mime_type: &str, file_name: &str) -> Option<String> {
    let mime = mime_type.to_ascii_lowercase();
    let ext = extension(file_name);

    if mime_looks_textual(&mime) || TEXT_EXTENSIONS.contains(&ext.as_str()) {
        let text = decode_best_effort(bytes);
        if !text.is_empty() {
            return Some(text);
        }
    }

    if mime == PDF_MIME || ext == "pdf" {
        return extract_pdf(bytes);
    }

    if mime == DOCX_MIME || ext == "docx" {
        return extract_docx(bytes);
    }

    Some(decode_best_effort(bytes)).filter(|text| !text.is_empty())
}

fn mime_looks_textual(mime: &str) -> bool {
    mime.starts_with("text/") || TEXTUAL_MIMES.contains(&mime)
}

fn extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// UTF-8, falling back to Latin-1 when the bytes are not valid UTF-8.
pub fn decode_best_effort(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn extract_pdf(bytes: &[u8]) -> Option<String> {
    // pdf-extract can panic on unusual fonts.
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    match result {
        Ok(Ok(text)) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
        Ok(Err(err)) => {
            debug!(error = %err, "PDF extraction failed");
            None
        }
        Err(_) => {
            debug!("PDF extraction panicked");
            None
        }
    }
}

fn extract_docx(bytes: &[u8]) -> Option<String> {
    let mut archive = match ZipArchive::new(Cursor::new(bytes)) {
        Ok(archive) => archive,
        Err(err) => {
            debug!(error = %err, "Failed to open DOCX archive");
            return None;
        }
    };

    let mut xml = String::new();
    match archive.by_name(DOCX_BODY_PATH) {
        Ok(mut file) => {
            if let Err(err) = file.read_to_string(&mut xml) {
                debug!(error = %err, "Failed to read DOCX body");
                return None;
            }
        }
        Err(err) => {
            debug!(error = %err, "DOCX body missing");
            return None;
        }
    }

    Some(docx_paragraphs(&xml)).filter(|text| !text.trim().is_empty())
}

/// Paragraph text of a WordprocessingML body, one line per `w:p`.
fn docx_paragraphs(xml: &str) -> String {
    let mut reader = XmlReader::from_str(xml);
    let mut buf = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:t" => in_text = true,
                b"w:p" => current.clear(),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                if let Ok(content) = t.unescape() {
                    current.push_str(&content);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    paragraphs.join("\n")
}
