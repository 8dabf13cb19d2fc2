//! PDF text extraction module
//!
//! Extracts text content from PDF files using lopdf.

use tracing::{debug, warn};
use veridex_common::errors::{AppError, Result};

/// Extract cleaned text from a PDF, one entry per page.
///
/// Pages that fail to parse are kept as empty strings so page numbers stay
/// aligned with the document. Fails only when the document itself cannot be
/// parsed or no page yields any text.
pub fn extract_pages(bytes: &[u8], source: &str) -> Result<Vec<String>> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| AppError::Load {
        file: source.to_string(),
        message: format!("Failed to parse PDF: {}", e),
    })?;

    let page_ids: Vec<_> = doc.page_iter().collect();
    debug!(page_count = page_ids.len(), source = source, "Extracting text from PDF");

    let mut pages = Vec::with_capacity(page_ids.len());
    for (index, page_id) in page_ids.into_iter().enumerate() {
        match doc.get_page_content(page_id) {
            Ok(content) => {
                let raw = extract_text_from_content(&content);
                pages.push(clean_text(&raw));
            }
            Err(e) => {
                warn!(page = index, error = %e, source = source, "Failed to extract text from page, skipping");
                pages.push(String::new());
            }
        }
    }

    if pages.iter().all(|p| p.is_empty()) {
        return Err(AppError::Load {
            file: source.to_string(),
            message: "No text content extracted from PDF".to_string(),
        });
    }

    Ok(pages)
}

/// Extract text from a PDF content stream
fn extract_text_from_content(content: &[u8]) -> String {
    // Simple text extraction - looks for text between BT and ET operators
    let content_str = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;
    let mut current_text = String::new();

    for line in content_str.lines() {
        let trimmed = line.trim();

        if trimmed == "BT" {
            in_text_block = true;
            continue;
        }

        if trimmed == "ET" {
            in_text_block = false;
            if !current_text.is_empty() {
                text.push_str(&current_text);
                text.push(' ');
                current_text.clear();
            }
            continue;
        }

        if in_text_block {
            // Look for text showing operators: Tj, TJ, ', "
            if let Some(text_content) = extract_text_from_operator(trimmed) {
                current_text.push_str(&text_content);
            }
        }
    }

    text
}

/// Extract text from a PDF text operator
fn extract_text_from_operator(line: &str) -> Option<String> {
    // Handle (text) Tj operator
    if line.ends_with("Tj") || line.ends_with("'") || line.ends_with("\"") {
        if let Some(start) = line.find('(') {
            if let Some(end) = line.rfind(')') {
                let text = &line[start + 1..end];
                return Some(decode_pdf_string(text));
            }
        }
    }

    // Handle [(text) num (text) num] TJ operator (array of text)
    if line.ends_with("TJ") {
        let mut result = String::new();
        let mut in_paren = false;
        let mut current = String::new();

        for ch in line.chars() {
            match ch {
                '(' => {
                    in_paren = true;
                }
                ')' => {
                    in_paren = false;
                    result.push_str(&decode_pdf_string(&current));
                    current.clear();
                }
                _ if in_paren => {
                    current.push(ch);
                }
                _ => {}
            }
        }

        if !result.is_empty() {
            return Some(result);
        }
    }

    None
}

/// Decode PDF string escapes
fn decode_pdf_string(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('(') => result.push('('),
                Some(')') => result.push(')'),
                Some(c) => result.push(c),
                None => {}
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Collapse runs of whitespace and strip byte-order marks
fn clean_text(text: &str) -> String {
    text.replace('\u{FEFF}', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
