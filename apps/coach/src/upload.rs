//! Client-side checks applied to a resume before anything is sent.

use bytes::Bytes;
use thiserror::Error;

pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

pub const ACCEPTED_RESUME_TYPES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Please upload a valid PDF or DOC/DOCX file.")]
    UnsupportedType(String),

    #[error("File size exceeds 5MB limit.")]
    TooLarge(usize),

    #[error("Please upload a resume and enter a job description.")]
    MissingInput,

    #[error("Please paste your resume text.")]
    BlankText,
}

/// A resume file as picked by the user.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl ResumeFile {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn validate(&self) -> Result<(), UploadError> {
        if !ACCEPTED_RESUME_TYPES.contains(&self.mime_type.as_str()) {
            return Err(UploadError::UnsupportedType(self.mime_type.clone()));
        }
        if self.size() > MAX_RESUME_BYTES {
            return Err(UploadError::TooLarge(self.size()));
        }
        Ok(())
    }
}

/// Where the resume text comes from: an uploaded document or pasted text.
#[derive(Debug, Clone)]
pub enum ResumeSource {
    File(ResumeFile),
    Text(String),
}

impl ResumeSource {
    pub fn validate(&self) -> Result<(), UploadError> {
        match self {
            ResumeSource::File(file) => file.validate(),
            ResumeSource::Text(text) if text.trim().is_empty() => Err(UploadError::BlankText),
            ResumeSource::Text(_) => Ok(()),
        }
    }
}
