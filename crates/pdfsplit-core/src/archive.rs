//! ZIP packaging of named byte buffers

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::PdfSplitError;

/// Package `(name, bytes)` entries into a deflated ZIP archive, in order.
///
/// Entry timestamps are pinned so identical input yields identical bytes.
pub fn package_zip<'a, I>(entries: I) -> Result<Vec<u8>, PdfSplitError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    for (name, bytes) in entries {
        zip.start_file(name, options)
            .map_err(|e| PdfSplitError::Internal(format!("Failed to create ZIP entry: {}", e)))?;
        zip.write_all(bytes)
            .map_err(|e| PdfSplitError::Internal(format!("Failed to write ZIP entry: {}", e)))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| PdfSplitError::Internal(format!("Failed to finalize ZIP: {}", e)))?;

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::unzip;

    #[test]
    fn test_package_preserves_order_and_content() {
        let zip = package_zip([("b.csv", &b"second"[..]), ("a.csv", &b"first"[..])]).unwrap();
        let entries = unzip(&zip);
        assert_eq!(
            entries,
            vec![
                ("b.csv".to_string(), b"second".to_vec()),
                ("a.csv".to_string(), b"first".to_vec()),
            ]
        );
    }

    #[test]
    fn test_package_empty_is_valid_archive() {
        let zip = package_zip(std::iter::empty()).unwrap();
        assert!(unzip(&zip).is_empty());
    }

    #[test]
    fn test_package_is_deterministic() {
        let entries = [("x.pdf", &b"%PDF-1.7"[..])];
        assert_eq!(package_zip(entries).unwrap(), package_zip(entries).unwrap());
    }
}
