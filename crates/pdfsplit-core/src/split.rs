//! CSV-driven PDF split
//!
//! Each included row of a split table becomes its own PDF containing the
//! row's page range. Rows may overlap; every row yields an independent
//! fragment.

use tracing::{debug, info, warn};

use crate::archive::package_zip;
use crate::document::SourcePdf;
use crate::error::PdfSplitError;
use crate::model::{Fragment, FragmentSet, RangeRecord};
use crate::ranges::{parse_range_csv, validate_ranges};
use crate::sanitize::sanitize_filename;

pub const FRAGMENT_EXTENSION: &str = "pdf";

/// Split `pdf_bytes` according to the table in `csv_bytes` and ZIP the fragments.
///
/// The whole table is validated before any page is copied. A table with no
/// included rows produces an empty archive.
pub fn split_pdf_by_csv(pdf_bytes: &[u8], csv_bytes: &[u8]) -> Result<Vec<u8>, PdfSplitError> {
    let source = SourcePdf::load(pdf_bytes)?;
    let records = parse_range_csv(csv_bytes)?;

    validate_ranges(&records, source.page_count())?;
    let fragments = extract_fragments(&source, &records)?;

    info!(
        rows = records.len(),
        fragments = fragments.len(),
        pages = source.page_count(),
        "Split PDF by CSV"
    );

    package_zip(fragments.entries())
}

/// Build one fragment per included record, in record order.
///
/// Records must already have passed [`validate_ranges`].
pub fn extract_fragments(
    source: &SourcePdf,
    records: &[RangeRecord],
) -> Result<FragmentSet, PdfSplitError> {
    let mut fragments = FragmentSet::new();

    for record in records.iter().filter(|r| r.included) {
        let (start, end) = page_bounds(record)?;
        let bytes = source.copy_page_range(start, end)?;

        let filename = format!(
            "{}.{}",
            sanitize_filename(&record.name, record.start_page, record.end_page),
            FRAGMENT_EXTENSION
        );
        debug!(%filename, start, end, pages = record.page_span(), "Extracted fragment");

        if fragments.insert(Fragment {
            filename: filename.clone(),
            bytes,
        }) {
            warn!(%filename, "Duplicate fragment name, keeping the later range");
        }
    }

    Ok(fragments)
}

fn page_bounds(record: &RangeRecord) -> Result<(u32, u32), PdfSplitError> {
    let convert = |page: i64| {
        u32::try_from(page).map_err(|_| {
            PdfSplitError::Validation(format!("Page {} is out of range", page))
        })
    };
    Ok((convert(record.start_page)?, convert(record.end_page)?))
}
