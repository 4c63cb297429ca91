//! Source document access
//!
//! Wraps a parsed lopdf [`Document`] with the handful of operations both
//! pipelines need: page counting, outline traversal, destination to page
//! resolution and whole-page range copies.

use std::collections::{HashMap, HashSet};

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, warn};

use crate::error::PdfSplitError;

pub const PASSWORD_PROTECTED: &str = "PDF is password-protected";

const ENCRYPT_KEY: &[u8] = b"/Encrypt";

/// Named destination lookups and `/D` indirections are followed at most this deep
const MAX_INDIRECTION: usize = 32;

/// One entry of the document's bookmark tree, as stored in the file
#[derive(Debug, Clone)]
pub struct OutlineItem {
    pub title: String,
    /// Raw `/Dest` value, or the `/D` of a `/GoTo` action
    pub destination: Option<Object>,
    pub children: Vec<OutlineItem>,
}

/// A loaded, unencrypted source PDF
pub struct SourcePdf {
    doc: Document,
    page_numbers: HashMap<ObjectId, u32>,
    page_count: u32,
}

impl SourcePdf {
    /// Parse PDF bytes, rejecting encrypted or page-less documents
    pub fn load(bytes: &[u8]) -> Result<Self, PdfSplitError> {
        let doc = Document::load_mem(bytes).map_err(|e| {
            // a security handler lopdf cannot read still reports as encrypted
            if contains_encrypt_key(bytes) {
                PdfSplitError::Validation(PASSWORD_PROTECTED.into())
            } else {
                PdfSplitError::Validation(format!("Invalid PDF file: {}", e))
            }
        })?;

        if doc.is_encrypted() || doc.trailer.has(b"Encrypt") {
            return Err(PdfSplitError::Validation(PASSWORD_PROTECTED.into()));
        }

        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(PdfSplitError::Validation(
                "Invalid PDF file: document has no pages".into(),
            ));
        }

        let page_count = pages.len() as u32;
        let page_numbers = pages.into_iter().map(|(num, id)| (id, num)).collect();
        debug!(page_count, "Loaded source PDF");

        Ok(Self {
            doc,
            page_numbers,
            page_count,
        })
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// The bookmark tree under the catalog's `/Outlines`.
    ///
    /// `None` when the document has no outline dictionary; an outline
    /// dictionary without entries yields an empty list.
    pub fn outline(&self) -> Option<Vec<OutlineItem>> {
        let outlines = self.resolve_dict(self.catalog()?.get(b"Outlines").ok()?)?;
        let mut visited = HashSet::new();
        Some(match outlines.get(b"First") {
            Ok(first) => self.read_outline_level(first, &mut visited),
            Err(_) => Vec::new(),
        })
    }

    /// Resolve a destination (explicit array, named destination, or
    /// destination dictionary) to a 1-indexed page number
    pub fn resolve_page_number(&self, destination: &Object) -> Result<u32, PdfSplitError> {
        let explicit = self
            .explicit_destination(destination, 0)
            .ok_or_else(|| PdfSplitError::Validation("Unresolvable outline destination".into()))?;

        match explicit.first() {
            Some(Object::Reference(id)) => self.page_numbers.get(id).copied().ok_or_else(|| {
                PdfSplitError::Validation(format!(
                    "Destination points at {:?}, which is not a page",
                    id
                ))
            }),
            // Remote-style destinations carry a 0-based page index
            Some(Object::Integer(index)) => u32::try_from(*index)
                .ok()
                .map(|i| i + 1)
                .filter(|page| *page <= self.page_count)
                .ok_or_else(|| {
                    PdfSplitError::Validation(format!("Destination page index {} out of range", index))
                }),
            _ => Err(PdfSplitError::Validation("Destination has no page target".into())),
        }
    }

    /// Compose a new document containing pages `start..=end` (1-indexed)
    pub fn copy_page_range(&self, start: u32, end: u32) -> Result<Vec<u8>, PdfSplitError> {
        if start == 0 || end < start || end > self.page_count {
            return Err(PdfSplitError::Validation(format!(
                "Page range {}-{} is outside 1-{}",
                start, end, self.page_count
            )));
        }

        let mut fragment = self.doc.clone();

        let pages_to_delete: Vec<u32> = (1..=self.page_count)
            .filter(|page| *page < start || *page > end)
            .collect();
        if !pages_to_delete.is_empty() {
            fragment.delete_pages(&pages_to_delete);
        }

        // Source bookmarks would point at pages that no longer exist
        if let Ok(root_id) = fragment.trailer.get(b"Root").and_then(Object::as_reference) {
            if let Ok(catalog) = fragment
                .get_object_mut(root_id)
                .and_then(Object::as_dict_mut)
            {
                catalog.remove(b"Outlines");
            }
        }

        fragment.prune_objects();
        fragment.compress();

        let mut buffer = Vec::new();
        fragment
            .save_to(&mut buffer)
            .map_err(|e| PdfSplitError::Internal(format!("Save failed: {}", e)))?;

        Ok(buffer)
    }

    fn read_outline_level(
        &self,
        first: &Object,
        visited: &mut HashSet<ObjectId>,
    ) -> Vec<OutlineItem> {
        let mut items = Vec::new();
        let mut cursor = first.as_reference().ok();

        while let Some(id) = cursor {
            if !visited.insert(id) {
                warn!(?id, "Outline item visited twice, stopping this level");
                break;
            }
            let Some(entry) = self.doc.get_object(id).ok().and_then(|o| o.as_dict().ok()) else {
                break;
            };

            let title = entry
                .get(b"Title")
                .ok()
                .and_then(|title| self.resolve(title))
                .map(decode_text_string)
                .unwrap_or_default();
            let children = match entry.get(b"First") {
                Ok(child) => self.read_outline_level(child, visited),
                Err(_) => Vec::new(),
            };

            items.push(OutlineItem {
                title: title.trim().to_string(),
                destination: self.item_destination(entry),
                children,
            });

            cursor = entry.get(b"Next").and_then(Object::as_reference).ok();
        }

        items
    }

    fn item_destination(&self, entry: &Dictionary) -> Option<Object> {
        if let Ok(dest) = entry.get(b"Dest") {
            return Some(dest.clone());
        }

        let action = self.resolve_dict(entry.get(b"A").ok()?)?;
        match action.get(b"S") {
            Ok(Object::Name(kind)) if kind.as_slice() == b"GoTo" => action.get(b"D").ok().cloned(),
            _ => None,
        }
    }

    fn explicit_destination<'a>(&'a self, dest: &'a Object, depth: usize) -> Option<&'a [Object]> {
        if depth > MAX_INDIRECTION {
            return None;
        }

        match self.resolve(dest)? {
            Object::Array(parts) => Some(parts.as_slice()),
            Object::Dictionary(dict) => self.explicit_destination(dict.get(b"D").ok()?, depth + 1),
            Object::String(name, _) | Object::Name(name) => {
                let target = self.named_destination(name)?;
                self.explicit_destination(target, depth + 1)
            }
            _ => None,
        }
    }

    /// Look a name up in the catalog `/Dests` dictionary, then the `/Names` tree
    fn named_destination(&self, name: &[u8]) -> Option<&Object> {
        let catalog = self.catalog()?;

        if let Some(dests) = catalog.get(b"Dests").ok().and_then(|d| self.resolve_dict(d)) {
            if let Ok(found) = dests.get(name) {
                return Some(found);
            }
        }

        let names = self.resolve_dict(catalog.get(b"Names").ok()?)?;
        let tree = self.resolve_dict(names.get(b"Dests").ok()?)?;
        self.name_tree_lookup(tree, name, 0)
    }

    fn name_tree_lookup<'a>(
        &'a self,
        node: &'a Dictionary,
        name: &[u8],
        depth: usize,
    ) -> Option<&'a Object> {
        if depth > MAX_INDIRECTION {
            return None;
        }

        if let Some(pairs) = node.get(b"Names").ok().and_then(|n| self.resolve_array(n)) {
            for pair in pairs.chunks(2) {
                if let [key, value] = pair {
                    if let Some(Object::String(key, _)) = self.resolve(key) {
                        if key.as_slice() == name {
                            return Some(value);
                        }
                    }
                }
            }
        }

        let kids = node.get(b"Kids").ok().and_then(|k| self.resolve_array(k))?;
        kids.iter()
            .filter_map(|kid| self.resolve_dict(kid))
            .find_map(|kid| self.name_tree_lookup(kid, name, depth + 1))
    }

    fn catalog(&self) -> Option<&Dictionary> {
        self.resolve_dict(self.doc.trailer.get(b"Root").ok()?)
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        match object {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }

    fn resolve_dict<'a>(&'a self, object: &'a Object) -> Option<&'a Dictionary> {
        self.resolve(object)?.as_dict().ok()
    }

    fn resolve_array<'a>(&'a self, object: &'a Object) -> Option<&'a Vec<Object>> {
        self.resolve(object)?.as_array().ok()
    }
}

fn contains_encrypt_key(bytes: &[u8]) -> bool {
    bytes
        .windows(ENCRYPT_KEY.len())
        .any(|window| window == ENCRYPT_KEY)
}

/// Decode a PDF text string: UTF-16BE when it carries a BOM, otherwise
/// PDFDocEncoding read as Latin-1
fn decode_text_string(object: &Object) -> String {
    let Object::String(bytes, _) = object else {
        return String::new();
    };

    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
            char::decode_utf16(units)
                .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        }
        None => bytes.iter().map(|&b| b as char).collect(),
    }
}
