//! Reader error types
//!
//! One error enum for the whole load/render pipeline. Which kinds abort a
//! load and which are reported as non-fatal status is decided by the reader,
//! see [`ReaderError::is_load_failure`].

use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReaderError {
    /// No file matched the extensions expected for the detected input kind
    #[error("{0}")]
    NoCompatibleContent(String),

    /// The document parser rejected the input
    #[error("Parse error: {0}")]
    Parse(String),

    /// Archive entry or directory enumeration failure
    #[error("Failed to decode {context}: {detail}")]
    Decode { context: String, detail: String },

    /// Failure while producing display content after a successful load
    #[error("Render error: {0}")]
    Render(String),

    /// A page handle was requested after the page had been released
    #[error("Page '{0}' was requested after its handle was revoked")]
    HandleRevoked(String),

    #[error("No input files were provided")]
    EmptyInput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReaderError {
    pub fn decode(context: impl Into<String>, detail: impl Display) -> Self {
        Self::Decode {
            context: context.into(),
            detail: detail.to_string(),
        }
    }

    pub fn render(detail: impl Display) -> Self {
        Self::Render(detail.to_string())
    }

    /// True for errors that abort a load atomically (reset then report).
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::NoCompatibleContent(_) | Self::Decode { .. } | Self::Io(_) | Self::EmptyInput
        )
    }
}

pub type Result<T> = std::result::Result<T, ReaderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_failures_are_classified() {
        assert!(ReaderError::NoCompatibleContent("none".into()).is_load_failure());
        assert!(ReaderError::decode("archive", "bad header").is_load_failure());
        assert!(!ReaderError::Parse("broken xref".into()).is_load_failure());
        assert!(!ReaderError::render("rasterize failed").is_load_failure());
    }

    #[test]
    fn decode_message_names_context() {
        let err = ReaderError::decode("archive entry 'a.png'", "crc mismatch");
        assert_eq!(
            err.to_string(),
            "Failed to decode archive entry 'a.png': crc mismatch"
        );
    }
}
