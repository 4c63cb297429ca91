//! Filesystem-safe basenames for archive entries

/// Build a basename from a user-supplied title.
///
/// Characters outside `[A-Za-z0-9 _.-]` become `_`, then leading and
/// trailing underscores are stripped. An empty result falls back to
/// `part_{start}_{end}`.
pub fn sanitize_filename(title: &str, start: i64, end: i64) -> String {
    let cleaned: String = title
        .chars()
        .map(|ch| if is_allowed(ch) { ch } else { '_' })
        .collect();
    let cleaned = cleaned.trim_matches('_');

    if cleaned.is_empty() {
        format!("part_{}_{}", start, end)
    } else {
        cleaned.to_string()
    }
}

fn is_allowed(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '_' | '-' | '.')
}
