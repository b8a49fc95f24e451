//! Canonical identity keys for catalog entities.
//!
//! A slug is the deduplication key used for every album and artist entry in
//! the content store, so the mapping must stay stable across releases.

/// Derive a URL-safe key from free text.
///
/// Trims the input, replaces every run of characters outside
/// `[A-Za-z0-9_-]` with a single `-` and lowercases the result (ASCII only).
/// Blank input yields an empty slug.
pub fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c.to_ascii_lowercase());
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }

    out
}

/// Composite album key: `<artist>-<title>[-<year>]`.
///
/// Blank components are left out of the join; the year is only appended when
/// it is known (greater than zero).
pub fn album_slug(artist_slug: &str, title: &str, year: u32) -> String {
    let title_slug = slug(title);
    let mut result = [artist_slug, title_slug.as_str()]
        .iter()
        .filter(|part| !part.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("-");

    if year > 0 {
        result.push('-');
        result.push_str(&year.to_string());
    }
    result
}
