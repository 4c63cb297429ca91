//! PDF bookmark export and CSV-driven splitting
//!
//! Two pipelines over one record shape (`split,name,from,to`):
//! - [`export_bookmarks_zip`]: outline tree -> one range table per depth -> ZIP of CSVs
//! - [`split_pdf_by_csv`]: range table + PDF -> validated ranges -> ZIP of PDF fragments
//!
//! Both are synchronous and stateless; every call owns its parsed document.

pub mod archive;
pub mod bookmarks;
pub mod document;
pub mod error;
pub mod model;
pub mod ranges;
pub mod sanitize;
pub mod split;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use bookmarks::{export_bookmarks_zip, NO_BOOKMARKS};
pub use document::{SourcePdf, PASSWORD_PROTECTED};
pub use error::{ErrorKind, PdfSplitError};
pub use model::{Fragment, FragmentSet, OutlineNode, RangeRecord};
pub use ranges::{parse_range_csv, validate_ranges};
pub use sanitize::sanitize_filename;
pub use split::split_pdf_by_csv;

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, PdfSplitError> {
    SourcePdf::load(bytes).map(|pdf| pdf.page_count())
}
