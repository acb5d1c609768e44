use tracing::info;

use crate::errors::AppError;

const PDF_MAGIC: &[u8] = b"%PDF";
const LOG_PREVIEW_CHARS: usize = 200;

/// Pulls plain text out of an uploaded resume.
///
/// PDFs go through `pdf-extract`; anything else must already be UTF-8 text.
pub fn extract_resume_text(bytes: &[u8]) -> Result<String, AppError> {
    let raw = if bytes.starts_with(PDF_MAGIC) {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| AppError::Extraction(format!("Failed to parse PDF: {e}")))?
    } else {
        std::str::from_utf8(bytes)
            .map_err(|_| {
                AppError::Extraction(
                    "Unsupported document format; upload a PDF or paste the resume text".into(),
                )
            })?
            .to_string()
    };

    let text = normalize_resume_text(&raw)?;
    info!("Extracted resume text: {}...", preview(&text));
    Ok(text)
}

/// Trims pasted or extracted text; blank input is an error.
pub fn normalize_resume_text(raw: &str) -> Result<String, AppError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(AppError::Extraction("Empty resume text extracted".into()));
    }
    Ok(text.to_string())
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
