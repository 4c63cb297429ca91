//! In-memory PDF and archive helpers for tests
//!
//! These builders panic on failure; they are only meant for test code.

use std::io::{Cursor, Read};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

/// A document with `num_pages` labelled pages and a catalog, not yet saved.
///
/// Returns the document, its page ids in order, and the catalog id.
pub fn blank_document(num_pages: u32) -> (Document, Vec<ObjectId>, ObjectId) {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();

    for i in 0..num_pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                ),
                Operation::new("Td", vec![Object::Integer(10), Object::Integer(40)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("Page {}", i + 1).into_bytes(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().expect("encode page content"),
        ));

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(72),
                    Object::Integer(72),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
        ]);
        page_ids.push(doc.add_object(page));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    (doc, page_ids, catalog_id)
}

pub fn save(mut doc: Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("save test PDF");
    buffer
}

pub fn set_catalog_entry(doc: &mut Document, catalog_id: ObjectId, key: &str, value: Object) {
    doc.get_object_mut(catalog_id)
        .and_then(Object::as_dict_mut)
        .expect("catalog dictionary")
        .set(key, value);
}

/// A PDF with `num_pages` pages and no outline
pub fn create_test_pdf(num_pages: u32) -> Vec<u8> {
    let (doc, _, _) = blank_document(num_pages);
    save(doc)
}

/// A PDF whose outline is given as a pre-order list of `(depth, title, page)`.
///
/// Depths must start at 0 and grow by at most one per entry; pages are
/// 1-indexed. An empty list produces an `/Outlines` dictionary with no items.
pub fn pdf_with_outline(num_pages: u32, entries: &[(usize, &str, u32)]) -> Vec<u8> {
    let (mut doc, page_ids, catalog_id) = blank_document(num_pages);
    let outlines_id = doc.new_object_id();
    let item_ids: Vec<ObjectId> = entries.iter().map(|_| doc.new_object_id()).collect();

    let mut parents: Vec<Option<usize>> = Vec::with_capacity(entries.len());
    let mut open: Vec<usize> = Vec::new();
    for (idx, (depth, _, _)) in entries.iter().enumerate() {
        open.truncate(*depth);
        parents.push(open.last().copied());
        open.push(idx);
    }

    let children_of = |parent: Option<usize>| -> Vec<usize> {
        (0..entries.len()).filter(|i| parents[*i] == parent).collect()
    };

    for (idx, (_, title, page)) in entries.iter().enumerate() {
        let parent_ref = parents[idx].map_or(outlines_id, |p| item_ids[p]);
        let siblings = children_of(parents[idx]);
        let position = siblings.iter().position(|s| *s == idx).unwrap_or(0);

        let mut item = Dictionary::from_iter(vec![
            ("Title", Object::string_literal(*title)),
            ("Parent", Object::Reference(parent_ref)),
            (
                "Dest",
                Object::Array(vec![
                    Object::Reference(page_ids[(*page - 1) as usize]),
                    Object::Name(b"Fit".to_vec()),
                ]),
            ),
        ]);
        if position > 0 {
            item.set("Prev", Object::Reference(item_ids[siblings[position - 1]]));
        }
        if let Some(next) = siblings.get(position + 1) {
            item.set("Next", Object::Reference(item_ids[*next]));
        }

        let kids = children_of(Some(idx));
        if let (Some(first), Some(last)) = (kids.first(), kids.last()) {
            item.set("First", Object::Reference(item_ids[*first]));
            item.set("Last", Object::Reference(item_ids[*last]));
            item.set("Count", Object::Integer(kids.len() as i64));
        }

        doc.objects.insert(item_ids[idx], Object::Dictionary(item));
    }

    let mut outlines = Dictionary::from_iter(vec![("Type", Object::Name(b"Outlines".to_vec()))]);
    let top = children_of(None);
    if let (Some(first), Some(last)) = (top.first(), top.last()) {
        outlines.set("First", Object::Reference(item_ids[*first]));
        outlines.set("Last", Object::Reference(item_ids[*last]));
        outlines.set("Count", Object::Integer(entries.len() as i64));
    }
    doc.objects.insert(outlines_id, Object::Dictionary(outlines));
    set_catalog_entry(&mut doc, catalog_id, "Outlines", Object::Reference(outlines_id));

    save(doc)
}

/// A PDF carrying a standard security handler entry in its trailer
pub fn encrypted_pdf(num_pages: u32) -> Vec<u8> {
    let (mut doc, _, _) = blank_document(num_pages);

    let encrypt = Dictionary::from_iter(vec![
        ("Filter", Object::Name(b"Standard".to_vec())),
        ("V", Object::Integer(1)),
        ("R", Object::Integer(2)),
        ("O", Object::String(vec![0x41; 32], StringFormat::Hexadecimal)),
        ("U", Object::String(vec![0x42; 32], StringFormat::Hexadecimal)),
        ("P", Object::Integer(-4)),
    ]);
    let encrypt_id = doc.add_object(encrypt);
    doc.trailer.set("Encrypt", Object::Reference(encrypt_id));
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(vec![0x01; 16], StringFormat::Hexadecimal),
            Object::String(vec![0x01; 16], StringFormat::Hexadecimal),
        ]),
    );

    save(doc)
}

/// Read every entry of a ZIP archive, in archive order
pub fn unzip(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid ZIP archive");
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).expect("ZIP entry");
            let mut data = Vec::new();
            file.read_to_end(&mut data).expect("read ZIP entry");
            (file.name().to_string(), data)
        })
        .collect()
}

/// Page count of a PDF produced by the splitter
pub fn page_count(bytes: &[u8]) -> usize {
    Document::load_mem(bytes).expect("valid PDF").get_pages().len()
}

/// Text of every page in order, as drawn by [`blank_document`] ("Page N")
pub fn page_texts(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("valid PDF");
    doc.get_pages()
        .keys()
        .map(|page| doc.extract_text(&[*page]).expect("page text").trim().to_string())
        .collect()
}
