//! Path segment helpers shared by route filters.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(https?://[^/?#]*)?(.*)$").expect("url prefix pattern is valid"));

/// Remove the leading segment captured by `pattern` from `path`.
///
/// `pattern` must be anchored at the start and expose the segment value as
/// capture group 1; everything up to the end of that group is removed. Returns
/// the captured value, or `None` with `path` untouched when nothing matched.
/// A path emptied by the removal becomes `/`.
pub fn extract_segment(pattern: &Regex, path: &mut String) -> Option<String> {
    let captures = pattern.captures(path)?;
    let segment = captures.get(1)?;
    let value = segment.as_str().to_string();
    let end = segment.end();

    path.replace_range(..end, "");
    if path.is_empty() {
        path.push('/');
    }

    Some(value)
}

/// Insert `segment` as the first path segment of `url`.
///
/// Absolute URLs keep their scheme and host in front of the new segment; a
/// bare root path collapses so that `/` becomes `/segment` and `/?q` becomes
/// `/segment?q`.
pub fn prepend_segment(url: &mut String, segment: &str) {
    let rewritten = match URL_PREFIX_RE.captures(url) {
        Some(captures) => {
            let host = captures.get(1).map_or("", |m| m.as_str());
            let rest = captures.get(2).map_or("", |m| m.as_str());
            let rest = match rest.strip_prefix('/') {
                Some(tail) if tail.is_empty() || tail.starts_with(['?', '#']) => tail,
                _ => rest,
            };
            let rest = match rest.chars().next() {
                None | Some('/' | '?' | '#') => rest.to_string(),
                Some(_) => format!("/{}", rest.trim_start_matches('/')),
            };
            format!("{}/{}{}", host, segment, rest)
        },
        None => return,
    };

    *url = rewritten;
}
