//! Status and placeholder messages in English and Thai.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    En,
    Th,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Th => "th",
        }
    }

    /// Like [`FromStr`], but anything unknown becomes English.
    pub fn from_code(code: &str) -> Self {
        code.parse().unwrap_or_default()
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "th" => Ok(Language::Th),
            other => Err(format!("unsupported language '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Ready,
    Loading,
    LoadError,
    Loaded,
    PdfFallback,
    RenderError,
    DropError,
    Error,
    SinglePlaceholder,
    VerticalPlaceholder,
}

fn english(key: MessageKey) -> &'static str {
    match key {
        MessageKey::Ready => "Ready to load files.",
        MessageKey::Loading => "Loading files…",
        MessageKey::LoadError => "Could not load files.",
        MessageKey::Loaded => "Loaded {{count}} pages.",
        MessageKey::PdfFallback => "Using built-in PDF viewer fallback.",
        MessageKey::RenderError => "Could not render pages.",
        MessageKey::DropError => "Could not read dropped items.",
        MessageKey::Error => "Error: {{message}}",
        MessageKey::SinglePlaceholder => "Select files or drop them here to start reading.",
        MessageKey::VerticalPlaceholder => {
            "Load a PDF, CBZ, ZIP, or images to display pages here."
        }
    }
}

fn thai(key: MessageKey) -> &'static str {
    match key {
        MessageKey::Ready => "พร้อมสำหรับการโหลดไฟล์",
        MessageKey::Loading => "กำลังโหลดไฟล์…",
        MessageKey::LoadError => "ไม่สามารถโหลดไฟล์ได้",
        MessageKey::Loaded => "โหลดหน้าสำเร็จ {{count}} หน้า",
        MessageKey::PdfFallback => "ใช้งานตัวอ่าน PDF สำรอง",
        MessageKey::RenderError => "ไม่สามารถแสดงหน้าได้",
        MessageKey::DropError => "ไม่สามารถอ่านไฟล์ที่ลากมาได้",
        MessageKey::Error => "เกิดข้อผิดพลาด: {{message}}",
        MessageKey::SinglePlaceholder => "เลือกไฟล์หรือวางไฟล์เพื่อเริ่มอ่าน",
        MessageKey::VerticalPlaceholder => "โหลด PDF, CBZ, ZIP หรือรูปภาพเพื่อแสดงหน้าอ่านที่นี่",
    }
}

pub fn template(language: Language, key: MessageKey) -> &'static str {
    match language {
        Language::En => english(key),
        Language::Th => thai(key),
    }
}

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*(\w+)\s*\}\}").unwrap_or_else(|e| panic!("invalid token pattern: {e}"))
});

/// Renders a message. Tokens without a matching parameter become empty.
pub fn format(language: Language, key: MessageKey, params: &[(&str, &str)]) -> String {
    TOKEN
        .replace_all(template(language, key), |caps: &Captures| {
            params
                .iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_default()
        })
        .into_owned()
}

pub fn text(language: Language, key: MessageKey) -> String {
    format(language, key, &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_is_interpolated() {
        assert_eq!(
            format(Language::En, MessageKey::Loaded, &[("count", "12")]),
            "Loaded 12 pages."
        );
        assert_eq!(
            format(Language::Th, MessageKey::Loaded, &[("count", "12")]),
            "โหลดหน้าสำเร็จ 12 หน้า"
        );
    }

    #[test]
    fn missing_parameter_renders_empty() {
        assert_eq!(format(Language::En, MessageKey::Error, &[]), "Error: ");
    }

    #[test]
    fn plain_messages_pass_through() {
        assert_eq!(text(Language::En, MessageKey::DropError), "Could not read dropped items.");
        assert_eq!(text(Language::Th, MessageKey::Ready), "พร้อมสำหรับการโหลดไฟล์");
    }

    #[test]
    fn unknown_language_code_is_english() {
        assert_eq!(Language::from_code("fr"), Language::En);
        assert_eq!(Language::from_code(" TH "), Language::Th);
        assert!("de".parse::<Language>().is_err());
    }
}
