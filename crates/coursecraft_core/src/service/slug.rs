//! Slug derivation for course and chapter handles.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// Derives a URL handle from a display title.
///
/// Lowercases, collapses every non-alphanumeric run into a single dash and
/// trims edge dashes. Titles with no usable characters fall back to
/// `"untitled"` so handles are never empty.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let collapsed = NON_SLUG_RE.replace_all(&lowered, "-");
    let trimmed = collapsed.trim_matches('-');
    if trimmed.is_empty() {
        return "untitled".to_string();
    }
    trimmed.to_string()
}
