//! Loose image sets

use std::sync::Arc;

use log::{debug, info};

use crate::error::{ReaderError, Result};
use crate::input::{InputFile, is_supported_image};
use crate::natural_sort::sort_naturally_by;
use crate::resource::{BlobStore, Page};

pub const NO_COMPATIBLE_IMAGES: &str = "No compatible image files found.";

/// Pages backed by individual image files
#[derive(Debug)]
pub struct ImageSetSource {
    pages: Vec<Page>,
}

impl ImageSetSource {
    /// Keeps the supported images among `files`, ordered naturally by their
    /// display name (which may be a folder-relative path).
    pub fn from_files(files: Vec<InputFile>, store: &BlobStore) -> Result<Self> {
        let offered = files.len();
        let mut images: Vec<InputFile> = files
            .into_iter()
            .filter(|file| is_supported_image(file.name()))
            .collect();
        if images.is_empty() {
            return Err(ReaderError::NoCompatibleContent(
                NO_COMPATIBLE_IMAGES.to_string(),
            ));
        }
        sort_naturally_by(&mut images, InputFile::name);

        let skipped = offered - images.len();
        if skipped > 0 {
            debug!("skipped {skipped} unsupported files");
        }

        let pages = images
            .into_iter()
            .map(|file| Page::new(file.name().to_string(), Arc::new(file), store.clone()))
            .collect::<Vec<_>>();
        info!("image set built with {} pages", pages.len());
        Ok(Self { pages })
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn release_all(&self) -> usize {
        self.pages.iter().filter(|page| page.release()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem(name: &str) -> InputFile {
        InputFile::from_bytes(name, vec![0u8; 4])
    }

    #[test]
    fn unsupported_files_are_dropped() {
        let store = BlobStore::new();
        let files = vec![
            mem("page10.jpg"),
            mem("notes.txt"),
            mem("page2.PNG"),
            mem("page1.webp"),
            mem("scan.bmp"),
            mem("page3.gif"),
            mem("page4.jpeg"),
        ];

        let source = ImageSetSource::from_files(files, &store).unwrap();
        let names: Vec<_> = source.pages().iter().map(Page::name).collect();
        assert_eq!(
            names,
            vec!["page1.webp", "page2.PNG", "page3.gif", "page4.jpeg", "page10.jpg"]
        );
    }

    #[test]
    fn relative_paths_take_part_in_ordering() {
        let store = BlobStore::new();
        let files = vec![
            mem("ch10/p1.png"),
            mem("ch2/p1.png"),
            mem("ch2/p10.png"),
            mem("ch2/p9.png"),
        ];

        let source = ImageSetSource::from_files(files, &store).unwrap();
        let names: Vec<_> = source.pages().iter().map(Page::name).collect();
        assert_eq!(names, vec!["ch2/p1.png", "ch2/p9.png", "ch2/p10.png", "ch10/p1.png"]);
    }

    #[test]
    fn no_images_is_no_compatible_content() {
        let store = BlobStore::new();
        let err = ImageSetSource::from_files(vec![mem("a.txt"), mem("b.pdf")], &store).unwrap_err();
        assert!(matches!(
            err,
            ReaderError::NoCompatibleContent(ref m) if m == NO_COMPATIBLE_IMAGES
        ));
    }
}
