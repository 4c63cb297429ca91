//! Records exchanged between the CSV tables and the PDF layer

/// One row of a split table: a flagged, named, inclusive page span.
///
/// Pages are kept signed so that out-of-range input (`0`, `-3`) survives
/// parsing and is rejected by validation with a precise message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRecord {
    pub included: bool,
    pub name: String,
    pub start_page: i64,
    pub end_page: i64,
}

impl RangeRecord {
    /// Number of pages covered, or 0 for an inverted range
    pub fn page_span(&self) -> u64 {
        if self.end_page < self.start_page {
            0
        } else {
            (self.end_page - self.start_page + 1) as u64
        }
    }
}

/// A flattened outline entry: tree position is carried by `depth` alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    /// 0 for entries directly under the outline root
    pub depth: usize,
    pub title: String,
    /// 1-indexed page the entry points to
    pub target_page: u32,
}

/// A composed PDF ready to be archived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Fragments keyed by filename, in first-insertion order.
///
/// Inserting a filename that is already present replaces its bytes in place.
#[derive(Debug, Clone, Default)]
pub struct FragmentSet {
    fragments: Vec<Fragment>,
}

impl FragmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fragment, returning `true` if it replaced an earlier one
    pub fn insert(&mut self, fragment: Fragment) -> bool {
        match self
            .fragments
            .iter_mut()
            .find(|existing| existing.filename == fragment.filename)
        {
            Some(existing) => {
                existing.bytes = fragment.bytes;
                true
            }
            None => {
                self.fragments.push(fragment);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn get(&self, filename: &str) -> Option<&Fragment> {
        self.fragments.iter().find(|f| f.filename == filename)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter()
    }

    /// `(filename, bytes)` pairs in archive order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.fragments
            .iter()
            .map(|f| (f.filename.as_str(), f.bytes.as_slice()))
    }
}
