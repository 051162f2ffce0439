//! Dropped-item enumeration
//!
//! A drop delivers files and directories. Directories are listed through a
//! paginated [`ChildReader`] that has to be drained until it returns an empty
//! batch. Siblings are then collected in parallel and joined, preserving their
//! listing order, before the load starts.

use std::path::{Path, PathBuf};

use log::debug;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::error::{ReaderError, Result};
use crate::input::InputFile;

/// Entries handed out per `read_batch` call by [`FsEntry`] directories.
pub const FS_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

/// A dropped file or directory
pub trait DroppedEntry: Send + Sync {
    /// Path relative to the drop root, e.g. `folder/page1.jpg`.
    fn name(&self) -> &str;

    fn kind(&self) -> EntryKind;

    fn file(&self) -> Result<InputFile>;

    fn reader(&self) -> Result<Box<dyn ChildReader>>;
}

/// Paginated directory listing
pub trait ChildReader: Send {
    /// Next batch of children. An empty batch means the listing is exhausted.
    fn read_batch(&mut self) -> Result<Vec<Box<dyn DroppedEntry>>>;
}

/// Every file beneath `entry`, depth first in listing order.
pub fn collect_files(entry: &dyn DroppedEntry) -> Result<Vec<InputFile>> {
    match entry.kind() {
        EntryKind::File => Ok(vec![entry.file()?]),
        EntryKind::Directory => {
            let mut reader = entry.reader()?;
            let mut children = Vec::new();
            loop {
                let batch = reader.read_batch()?;
                if batch.is_empty() {
                    break;
                }
                children.extend(batch);
            }
            debug!("'{}' listed {} children", entry.name(), children.len());
            collect_all(&children)
        }
        EntryKind::Other => Ok(Vec::new()),
    }
}

/// Collects a set of sibling entries in parallel and flattens the results.
pub fn collect_all(entries: &[Box<dyn DroppedEntry>]) -> Result<Vec<InputFile>> {
    let nested = entries
        .par_iter()
        .map(|entry| collect_files(entry.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    Ok(nested.into_iter().flatten().collect())
}

/// File system backed entry
#[derive(Debug, Clone)]
pub struct FsEntry {
    path: PathBuf,
    name: String,
    kind: EntryKind,
}

impl FsEntry {
    /// Entry for a dropped path, named by its final component.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)
            .map_err(|e| ReaderError::decode(format!("dropped item '{}'", path.display()), e))?;
        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else if metadata.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Ok(Self { path, name, kind })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DroppedEntry for FsEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EntryKind {
        self.kind
    }

    fn file(&self) -> Result<InputFile> {
        if self.kind != EntryKind::File {
            return Err(ReaderError::decode(
                format!("dropped item '{}'", self.name),
                "not a file",
            ));
        }
        Ok(InputFile::with_name(&self.path, &self.name))
    }

    fn reader(&self) -> Result<Box<dyn ChildReader>> {
        if self.kind != EntryKind::Directory {
            return Err(ReaderError::decode(
                format!("dropped item '{}'", self.name),
                "not a directory",
            ));
        }
        Ok(Box::new(FsChildReader {
            dir: self.path.clone(),
            prefix: self.name.clone(),
            listed: None,
        }))
    }
}

struct FsChildReader {
    dir: PathBuf,
    prefix: String,
    listed: Option<std::vec::IntoIter<FsEntry>>,
}

impl FsChildReader {
    fn list(&self) -> Result<Vec<FsEntry>> {
        let mut children = Vec::new();
        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry
                .map_err(|e| ReaderError::decode(format!("directory '{}'", self.prefix), e))?;
            // Symlinked files are read through; symlinked directories are skipped.
            let file_type = entry.file_type();
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() || (file_type.is_symlink() && entry.path().is_file()) {
                EntryKind::File
            } else {
                EntryKind::Other
            };
            children.push(FsEntry {
                name: format!("{}/{}", self.prefix, entry.file_name().to_string_lossy()),
                path: entry.into_path(),
                kind,
            });
        }
        Ok(children)
    }
}

impl ChildReader for FsChildReader {
    fn read_batch(&mut self) -> Result<Vec<Box<dyn DroppedEntry>>> {
        if self.listed.is_none() {
            self.listed = Some(self.list()?.into_iter());
        }
        let Some(listed) = self.listed.as_mut() else {
            return Ok(Vec::new());
        };
        Ok(listed
            .by_ref()
            .take(FS_BATCH_SIZE)
            .map(|entry| Box::new(entry) as Box<dyn DroppedEntry>)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::test_utils::write_tree;

    /// In-memory directory that hands out one child per batch
    struct MemDir {
        name: String,
        children: Vec<Arc<MemNode>>,
        batches: Arc<AtomicUsize>,
    }

    enum MemNode {
        File(String),
        Dir(MemDir),
        Broken(String),
    }

    impl DroppedEntry for Arc<MemNode> {
        fn name(&self) -> &str {
            match self.as_ref() {
                MemNode::File(name) | MemNode::Broken(name) => name,
                MemNode::Dir(dir) => &dir.name,
            }
        }

        fn kind(&self) -> EntryKind {
            match self.as_ref() {
                MemNode::File(_) => EntryKind::File,
                MemNode::Dir(_) | MemNode::Broken(_) => EntryKind::Directory,
            }
        }

        fn file(&self) -> Result<InputFile> {
            Ok(InputFile::from_bytes(self.name().to_string(), vec![0u8]))
        }

        fn reader(&self) -> Result<Box<dyn ChildReader>> {
            match self.as_ref() {
                MemNode::Dir(dir) => Ok(Box::new(MemReader {
                    remaining: dir.children.iter().rev().cloned().collect(),
                    batches: Arc::clone(&dir.batches),
                })),
                _ => Err(ReaderError::decode(
                    format!("directory '{}'", self.name()),
                    "permission denied",
                )),
            }
        }
    }

    struct MemReader {
        remaining: Vec<Arc<MemNode>>,
        batches: Arc<AtomicUsize>,
    }

    impl ChildReader for MemReader {
        fn read_batch(&mut self) -> Result<Vec<Box<dyn DroppedEntry>>> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .remaining
                .pop()
                .map(|node| vec![Box::new(node) as Box<dyn DroppedEntry>])
                .unwrap_or_default())
        }
    }

    fn file(name: &str) -> Arc<MemNode> {
        Arc::new(MemNode::File(name.to_string()))
    }

    #[test]
    fn paginated_reader_is_drained_until_empty() {
        let batches = Arc::new(AtomicUsize::new(0));
        let root: Arc<MemNode> = Arc::new(MemNode::Dir(MemDir {
            name: "vol".into(),
            children: vec![file("vol/p1.png"), file("vol/p2.png"), file("vol/p3.png")],
            batches: Arc::clone(&batches),
        }));

        let files = collect_files(&root).unwrap();
        let names: Vec<_> = files.iter().map(InputFile::name).collect();
        assert_eq!(names, vec!["vol/p1.png", "vol/p2.png", "vol/p3.png"]);
        assert_eq!(batches.load(Ordering::SeqCst), 4, "three batches plus the empty one");
    }

    #[test]
    fn nested_directories_keep_listing_order() {
        let inner = Arc::new(MemNode::Dir(MemDir {
            name: "vol/ch1".into(),
            children: vec![file("vol/ch1/a.png"), file("vol/ch1/b.png")],
            batches: Arc::default(),
        }));
        let root: Arc<MemNode> = Arc::new(MemNode::Dir(MemDir {
            name: "vol".into(),
            children: vec![inner, file("vol/cover.png")],
            batches: Arc::default(),
        }));

        let files = collect_files(&root).unwrap();
        let names: Vec<_> = files.iter().map(InputFile::name).collect();
        assert_eq!(names, vec!["vol/ch1/a.png", "vol/ch1/b.png", "vol/cover.png"]);
    }

    #[test]
    fn unreadable_directory_fails_the_whole_collection() {
        let root: Arc<MemNode> = Arc::new(MemNode::Dir(MemDir {
            name: "vol".into(),
            children: vec![file("vol/p1.png"), Arc::new(MemNode::Broken("vol/locked".into()))],
            batches: Arc::default(),
        }));

        let err = collect_files(&root).unwrap_err();
        assert!(matches!(err, ReaderError::Decode { .. }));
    }

    #[test]
    fn fs_entries_are_named_relative_to_the_drop_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("manga");
        write_tree(
            &root,
            &[
                ("page2.png", vec![2]),
                ("page1.png", vec![1]),
                ("extra/page3.png", vec![3]),
            ],
        );

        let entry = FsEntry::new(&root).unwrap();
        assert_eq!(entry.kind(), EntryKind::Directory);

        let mut names: Vec<_> = collect_files(&entry)
            .unwrap()
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["manga/extra/page3.png", "manga/page1.png", "manga/page2.png"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_do_not_loop() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("manga");
        write_tree(&root, &[("page1.png", vec![1])]);
        std::os::unix::fs::symlink(&root, root.join("again")).unwrap();
        std::os::unix::fs::symlink(root.join("page1.png"), root.join("page2.png")).unwrap();

        let entry = FsEntry::new(&root).unwrap();
        let names: Vec<_> = collect_files(&entry)
            .unwrap()
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        assert_eq!(names, vec!["manga/page1.png", "manga/page2.png"]);
    }

    #[test]
    fn fs_file_entry_reads_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        write_tree(dir.path(), &[("single.jpg", vec![7, 7])]);

        let entry = FsEntry::new(dir.path().join("single.jpg")).unwrap();
        let files = collect_files(&entry).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name(), "single.jpg");
        assert_eq!(&*files[0].read_bytes().unwrap(), &[7, 7]);
    }

    #[test]
    fn missing_path_is_a_decode_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = FsEntry::new(dir.path().join("gone")).unwrap_err();
        assert!(matches!(err, ReaderError::Decode { .. }));
    }
}
