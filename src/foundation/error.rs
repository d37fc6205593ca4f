/// Convenience result alias used across the crate.
pub type InkResult<T> = Result<T, InkError>;

/// Which document-level failure occurred while saving or loading a bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentErrorKind {
    /// A required bundle member is missing or unreadable.
    MalformedPackage,
    /// The bundle has no movie reference to write.
    MovieNotSet,
    /// The movie reference no longer points at a readable resource.
    MovieUnresolvable,
}

impl std::fmt::Display for DocumentErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MalformedPackage => "malformed package",
            Self::MovieNotSet => "movie not set",
            Self::MovieUnresolvable => "movie unresolvable",
        };
        f.write_str(s)
    }
}

/// Top-level error type.
#[derive(thiserror::Error, Debug)]
pub enum InkError {
    /// Input failed validation (bad rate, mixed rates, stroke already committed, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// Columnar stroke data could not be turned back into a stroke.
    #[error("decode error: {0}")]
    Codec(String),

    /// Rendering surface setup failed.
    #[error("render error: {0}")]
    Render(String),

    /// Bundle-level failure.
    #[error("document error ({kind}): {detail}")]
    Document {
        /// Failure class.
        kind: DocumentErrorKind,
        /// Human-readable detail (usually the member or path involved).
        detail: String,
    },

    /// Video probing or frame decoding failed.
    #[error("media error: {0}")]
    Media(String),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Any other error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl InkError {
    /// Build [`InkError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build [`InkError::Codec`].
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Build [`InkError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build [`InkError::Document`].
    pub fn document(kind: DocumentErrorKind, detail: impl Into<String>) -> Self {
        Self::Document {
            kind,
            detail: detail.into(),
        }
    }

    /// Build [`InkError::Media`].
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build [`InkError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Document failure class, if this is a document error.
    pub fn document_kind(&self) -> Option<DocumentErrorKind> {
        match self {
            Self::Document { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
