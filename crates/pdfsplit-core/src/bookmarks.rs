//! Bookmark export
//!
//! Flattens a document outline into depth-tagged entries, infers where each
//! entry's page range ends, and renders one CSV per depth level:
//!
//! ```text
//! "split","name","from","to"
//! "n","Chapter 1",1,2
//! ```

use std::collections::BTreeMap;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::{debug, info, warn};

use crate::archive::package_zip;
use crate::document::{OutlineItem, SourcePdf};
use crate::error::PdfSplitError;
use crate::model::OutlineNode;

pub const NO_BOOKMARKS: &str = "No bookmarks found in the PDF";

/// Page used when an outline destination cannot be resolved
pub const FALLBACK_PAGE: u32 = 1;

/// Exported rows are informational and never pre-flagged for splitting
const EXPORT_FLAG: &str = "n";

const CSV_HEADER: [&str; 4] = ["split", "name", "from", "to"];

/// One rendered CSV file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelCsv {
    pub depth: usize,
    pub filename: String,
    pub content: Vec<u8>,
}

/// Export the outline of `pdf_bytes` as a ZIP of `bookmarks_level_{N}.csv` files
pub fn export_bookmarks_zip(pdf_bytes: &[u8]) -> Result<Vec<u8>, PdfSplitError> {
    let source = SourcePdf::load(pdf_bytes)?;
    let levels = bookmark_csvs(&source)?;

    package_zip(
        levels
            .iter()
            .map(|level| (level.filename.as_str(), level.content.as_slice())),
    )
}

/// Render one CSV per outline depth, shallowest first
pub fn bookmark_csvs(source: &SourcePdf) -> Result<Vec<LevelCsv>, PdfSplitError> {
    let outline = source
        .outline()
        .ok_or_else(|| PdfSplitError::NotFound(NO_BOOKMARKS.into()))?;

    let nodes = flatten_outline(source, &outline);
    if nodes.is_empty() {
        return Err(PdfSplitError::NotFound(NO_BOOKMARKS.into()));
    }

    let end_pages = compute_end_pages(&nodes, source.page_count());
    let levels = group_by_depth(&nodes, &end_pages);

    info!(
        bookmarks = nodes.len(),
        levels = levels.len(),
        pages = source.page_count(),
        "Exporting bookmarks"
    );

    levels
        .into_iter()
        .map(|(depth, rows)| {
            Ok(LevelCsv {
                depth,
                filename: format!("bookmarks_level_{}.csv", depth),
                content: render_csv(&rows)?,
            })
        })
        .collect()
}

/// Depth-first, pre-order flattening of the outline tree
pub fn flatten_outline(source: &SourcePdf, outline: &[OutlineItem]) -> Vec<OutlineNode> {
    let mut nodes = Vec::new();
    flatten_into(source, outline, 0, &mut nodes);
    nodes
}

fn flatten_into(
    source: &SourcePdf,
    items: &[OutlineItem],
    depth: usize,
    nodes: &mut Vec<OutlineNode>,
) {
    for item in items {
        let resolved = match &item.destination {
            Some(destination) => source.resolve_page_number(destination),
            None => Err(PdfSplitError::Validation("Bookmark has no destination".into())),
        };
        let target_page = resolved.unwrap_or_else(|err| {
            warn!(title = %item.title, %err, "Falling back to page {}", FALLBACK_PAGE);
            FALLBACK_PAGE
        });

        debug!(depth, title = %item.title, target_page, "Bookmark");
        nodes.push(OutlineNode {
            depth,
            title: item.title.clone(),
            target_page,
        });

        flatten_into(source, &item.children, depth + 1, nodes);
    }
}

/// End page for every node, in node order.
///
/// A node's range runs until the next node at the same or a shallower depth
/// starts (its page minus one), or to `total_pages` when none follows. The
/// result is never smaller than the node's own start page.
///
/// Single pass: nodes still waiting for their terminator sit on a stack whose
/// depths strictly increase, so each new node closes exactly the entries at
/// its depth or deeper.
pub fn compute_end_pages(nodes: &[OutlineNode], total_pages: u32) -> Vec<u32> {
    let mut end_pages = vec![total_pages; nodes.len()];
    let mut open: Vec<usize> = Vec::new();

    for (idx, node) in nodes.iter().enumerate() {
        while let Some(&top) = open.last() {
            if nodes[top].depth < node.depth {
                break;
            }
            end_pages[top] = node.target_page.saturating_sub(1);
            open.pop();
        }
        open.push(idx);
    }

    for (end, node) in end_pages.iter_mut().zip(nodes) {
        *end = (*end).max(node.target_page);
    }

    end_pages
}

fn group_by_depth<'a>(
    nodes: &'a [OutlineNode],
    end_pages: &[u32],
) -> BTreeMap<usize, Vec<(&'a OutlineNode, u32)>> {
    let mut levels: BTreeMap<usize, Vec<(&OutlineNode, u32)>> = BTreeMap::new();
    for (node, end) in nodes.iter().zip(end_pages) {
        levels.entry(node.depth).or_default().push((node, *end));
    }
    levels
}

fn render_csv(rows: &[(&OutlineNode, u32)]) -> Result<Vec<u8>, PdfSplitError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());

    let csv_error = |e: csv::Error| PdfSplitError::Internal(format!("CSV write failed: {}", e));

    writer.write_record(CSV_HEADER).map_err(csv_error)?;
    for (node, end) in rows {
        let from = node.target_page.to_string();
        let to = end.to_string();
        writer
            .write_record([EXPORT_FLAG, node.title.as_str(), from.as_str(), to.as_str()])
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| PdfSplitError::Internal(format!("CSV flush failed: {}", e)))
}
