use std::path::PathBuf;

use thiserror::Error;

//
// ─── ERRORS (input validation) ─────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error("empty submission")]
    Empty,

    #[error("image reference cannot be empty")]
    EmptyImageRef,
}

//
// ─── IMAGE REFERENCE ───────────────────────────────────────────────────────────
//

/// Where the bytes of a submitted image come from.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// An image file on local disk, read when the request is built.
    File(PathBuf),
    /// An image already held in memory (camera capture, clipboard).
    Inline { file_name: String, bytes: Vec<u8> },
}

impl ImageRef {
    /// # Errors
    ///
    /// Returns `SubmissionError::EmptyImageRef` if the path is empty.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, SubmissionError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(SubmissionError::EmptyImageRef);
        }
        Ok(Self::File(path))
    }

    /// # Errors
    ///
    /// Returns `SubmissionError::EmptyImageRef` if there are no bytes.
    pub fn inline(
        file_name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Result<Self, SubmissionError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(SubmissionError::EmptyImageRef);
        }
        Ok(Self::Inline {
            file_name: file_name.into(),
            bytes,
        })
    }

    /// File name used when uploading; falls back to `image.jpg`.
    #[must_use]
    pub fn file_name(&self) -> String {
        match self {
            ImageRef::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "image.jpg".to_string()),
            ImageRef::Inline { file_name, .. } if !file_name.trim().is_empty() => {
                file_name.clone()
            }
            ImageRef::Inline { .. } => "image.jpg".to_string(),
        }
    }
}

impl std::fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageRef::File(path) => f.debug_tuple("File").field(path).finish(),
            ImageRef::Inline { file_name, bytes } => f
                .debug_struct("Inline")
                .field("file_name", file_name)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

//
// ─── SUBMISSION ────────────────────────────────────────────────────────────────
//

/// A validated answer or problem input: trimmed text, an image, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    text: Option<String>,
    image: Option<ImageRef>,
}

impl Submission {
    /// Build a submission, dropping text that is blank after trimming.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError::Empty` when neither text nor image remains.
    pub fn new(text: Option<&str>, image: Option<ImageRef>) -> Result<Self, SubmissionError> {
        let text = text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned);
        if text.is_none() && image.is_none() {
            return Err(SubmissionError::Empty);
        }
        Ok(Self { text, image })
    }

    /// # Errors
    ///
    /// Returns `SubmissionError::Empty` for blank text.
    pub fn text(text: &str) -> Result<Self, SubmissionError> {
        Self::new(Some(text), None)
    }

    #[must_use]
    pub fn image(image: ImageRef) -> Self {
        Self {
            text: None,
            image: Some(image),
        }
    }

    #[must_use]
    pub fn answer_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    #[must_use]
    pub fn image_ref(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }

    #[must_use]
    pub fn into_parts(self) -> (Option<String>, Option<ImageRef>) {
        (self.text, self.image)
    }
}
