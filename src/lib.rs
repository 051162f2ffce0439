pub mod enumerate;
pub mod error;
pub mod i18n;
pub mod input;
pub mod natural_sort;
pub mod pager;
pub mod reader;
pub mod render;
pub mod resource;
pub mod settings;
pub mod source;
pub mod status;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{ReaderError, Result};
pub use input::{InputFile, InputKind};
pub use reader::{LoadSummary, Reader};
pub use settings::ViewMode;
