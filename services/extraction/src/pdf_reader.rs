//! PDF text acquisition.
//!
//! Wraps `pdf-extract` and turns anything unreadable into
//! `SpecsheetError::UnreadablePdf` so a bad file fails its own ingestion
//! and nothing else.

use sha2::{Digest, Sha256};

use specsheet_utils::{SpecsheetError, SpecsheetResult};

/// Extracts the full text of a PDF from its byte stream.
pub fn read_pdf_text(data: &[u8]) -> SpecsheetResult<String> {
    let text = pdf_extract::extract_text_from_mem(data)
        .map_err(|e| SpecsheetError::unreadable_pdf(e.to_string()))?;

    if text.trim().is_empty() {
        return Err(SpecsheetError::unreadable_pdf(
            "document contains no extractable text",
        ));
    }

    Ok(text)
}

/// SHA-256 fingerprint of the uploaded bytes, hex encoded. Used to detect
/// re-uploads of an identical file.
pub fn file_fingerprint(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Caps text at `max_chars` characters for embedding into AI prompts,
/// respecting char boundaries.
pub fn truncate_for_prompt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let a = file_fingerprint(b"datasheet bytes");
        let b = file_fingerprint(b"datasheet bytes");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_differs_per_content() {
        assert_ne!(file_fingerprint(b"one"), file_fingerprint(b"two"));
    }

    #[test]
    fn test_garbage_bytes_are_unreadable() {
        let err = read_pdf_text(b"this is not a pdf").unwrap_err();
        assert_eq!(err.error_code(), "UNREADABLE_PDF");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "40°C ambient";
        let cut = truncate_for_prompt(text, 3);
        assert_eq!(cut, "40°");
        assert_eq!(truncate_for_prompt("short", 100), "short");
    }
}
