//! Lazy resource materialization

mod blob_store;
mod page;

pub use blob_store::{Blob, BlobStats, BlobStore, BlobUrl};
pub use page::{Page, PageContent};
