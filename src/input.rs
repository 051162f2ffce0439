//! Input files and classification
//!
//! An [`InputFile`] is what a picker or drop hands to the reader: a display
//! name (possibly a folder-relative path) plus bytes that are read only when
//! somebody needs them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;

pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];
pub const ARCHIVE_EXTENSIONS: &[&str] = &["cbz", "zip"];
pub const PDF_EXTENSION: &str = "pdf";

pub const PDF_MIME: &str = "application/pdf";
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";

#[derive(Clone)]
enum FileData {
    Disk(PathBuf),
    Memory(Arc<[u8]>),
}

/// A file offered to the reader
#[derive(Clone)]
pub struct InputFile {
    name: String,
    data: FileData,
}

impl InputFile {
    /// File on disk, named by its file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Self {
            name,
            data: FileData::Disk(path),
        }
    }

    /// File on disk with an explicit display name, e.g. `folder/page1.jpg`.
    pub fn with_name(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: FileData::Disk(path.into()),
        }
    }

    /// In-memory file.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            data: FileData::Memory(bytes.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.data {
            FileData::Disk(path) => Some(path),
            FileData::Memory(_) => None,
        }
    }

    /// Reads the file contents. Disk files are read on every call.
    pub fn read_bytes(&self) -> Result<Arc<[u8]>> {
        match &self.data {
            FileData::Disk(path) => Ok(std::fs::read(path)?.into()),
            FileData::Memory(bytes) => Ok(Arc::clone(bytes)),
        }
    }

    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }
}

impl fmt::Debug for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("InputFile");
        s.field("name", &self.name);
        match &self.data {
            FileData::Disk(path) => s.field("path", path),
            FileData::Memory(bytes) => s.field("memory_len", &bytes.len()),
        };
        s.finish()
    }
}

/// Lowercased extension of a name, if it has one.
pub fn extension_of(name: &str) -> Option<String> {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn has_extension(name: &str, allowed: &[&str]) -> bool {
    extension_of(name).is_some_and(|ext| allowed.contains(&ext.as_str()))
}

pub fn is_supported_image(name: &str) -> bool {
    has_extension(name, SUPPORTED_IMAGE_EXTENSIONS)
}

pub fn is_archive(name: &str) -> bool {
    has_extension(name, ARCHIVE_EXTENSIONS)
}

pub fn is_pdf(name: &str) -> bool {
    has_extension(name, &[PDF_EXTENSION])
}

/// MIME type implied by a file name's extension.
pub fn mime_from_name(name: &str) -> Option<&'static str> {
    match extension_of(name)?.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "pdf" => Some(PDF_MIME),
        _ => None,
    }
}

/// MIME type for a payload: the extension wins, then whatever the decoder
/// reported, then `application/octet-stream`.
pub fn guess_mime(name: &str, reported: Option<&str>) -> String {
    mime_from_name(name)
        .or(reported.filter(|m| !m.is_empty()))
        .unwrap_or(OCTET_STREAM_MIME)
        .to_string()
}

/// Kind of page source an input list turns into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Archive,
    Images,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Pdf => "pdf",
            InputKind::Archive => "archive",
            InputKind::Images => "images",
        }
    }
}

/// Classifies an input list. A single PDF or archive is opened as such;
/// everything else is treated as a set of images.
pub fn classify(files: &[InputFile]) -> Option<InputKind> {
    match files {
        [] => None,
        [only] if is_pdf(only.name()) => Some(InputKind::Pdf),
        [only] if is_archive(only.name()) => Some(InputKind::Archive),
        _ => Some(InputKind::Images),
    }
}
