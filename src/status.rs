use std::fmt;

use crate::i18n::{self, Language, MessageKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// The reader's single user-visible status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub message: String,
    pub level: StatusLevel,
    /// Underlying error text, when the message is a generic one
    pub detail: Option<String>,
}

impl Status {
    pub fn new(message: impl Into<String>, level: StatusLevel) -> Self {
        Self {
            message: message.into(),
            level,
            detail: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, StatusLevel::Info)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, StatusLevel::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, StatusLevel::Error)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn ready(language: Language) -> Self {
        Self::info(i18n::text(language, MessageKey::Ready))
    }

    /// Warnings and errors are both shown highlighted.
    pub fn is_alert(&self) -> bool {
        self.level != StatusLevel::Info
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({detail})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_status_is_localized_info() {
        let status = Status::ready(Language::Th);
        assert_eq!(status.level, StatusLevel::Info);
        assert_eq!(status.message, "พร้อมสำหรับการโหลดไฟล์");
        assert!(!status.is_alert());
    }

    #[test]
    fn detail_is_appended_on_display() {
        let status = Status::error("Could not load files.")
            .with_detail("No compatible image files found.");
        assert!(status.is_alert());
        assert_eq!(
            status.to_string(),
            "Could not load files. (No compatible image files found.)"
        );
    }
}
