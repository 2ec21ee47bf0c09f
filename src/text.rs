//! Text normalization applied before every model invocation.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:http|www)\S+").unwrap());
static DISALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9áéíóúñ\s.!?]").unwrap());

/// Normalizes review text into the form every classifier was trained on.
///
/// Lower-cases, strips URLs, drops every character outside the allow-list
/// (letters including accented/ñ, digits, whitespace, `.!?`), and collapses
/// runs of whitespace to single spaces. Idempotent.
///
/// # Examples
///
/// ```
/// use review_serve::text::normalize;
///
/// assert_eq!(normalize("GREAT product!!  (10/10)"), "great product!! 1010");
/// ```
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let no_urls = URL_RE.replace_all(&lowered, "");
    let allowed = DISALLOWED_RE.replace_all(&no_urls, "");
    allowed.split_whitespace().collect::<Vec<_>>().join(" ")
}
