//! Case-insensitive substitution between the backend and frontend domains.
//!
//! Every other component derives frontend URLs and relative paths through
//! these helpers so the trimmed frontend base stays the single source of truth.

use regex::{NoExpand, Regex, RegexBuilder};

/// Strip exactly one trailing slash.
pub fn trim_trailing_slash(s: &str) -> &str {
    s.strip_suffix('/').unwrap_or(s)
}

/// Append a trailing slash unless one is already present.
pub fn with_trailing_slash(s: &str) -> String {
    if s.ends_with('/') {
        s.to_string()
    } else {
        format!("{s}/")
    }
}

/// Case-insensitive matcher for the literal `needle`.
fn literal_pattern(needle: &str) -> Option<Regex> {
    // An escaped literal always compiles; `None` only guards the size limit.
    RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Whether `haystack` holds `needle`, folding case the same way
/// [`replace_ignore_case`] does.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }

    match literal_pattern(needle) {
        Some(pattern) => pattern.is_match(haystack),
        None => haystack.contains(needle),
    }
}

/// Replace every case-insensitive occurrence of `from` with `to`, leaving the
/// rest of `input` verbatim.
pub fn replace_ignore_case(input: &str, from: &str, to: &str) -> String {
    if from.is_empty() {
        return input.to_string();
    }

    match literal_pattern(from) {
        Some(pattern) => pattern.replace_all(input, NoExpand(to)).into_owned(),
        None => input.replace(from, to),
    }
}

pub fn to_frontend(url: &str, backend_base: &str, frontend_base: &str) -> String {
    replace_ignore_case(url, backend_base, frontend_base)
}

pub fn to_backend(url: &str, backend_base: &str, frontend_base: &str) -> String {
    replace_ignore_case(url, frontend_base, backend_base)
}

/// Home URL as seen from the admin area.
///
/// Inside the admin area, and for any scheme other than `rest`, home URLs point
/// at the frontend so "view site" style links leave the backend.
pub fn frontend_home_url(
    url: &str,
    path: &str,
    scheme: Option<&str>,
    is_admin: bool,
    frontend_base: Option<&str>,
) -> String {
    let Some(frontend_base) = frontend_base else {
        return url.to_string();
    };

    if scheme == Some("rest") || !is_admin {
        return url.to_string();
    }

    let base = with_trailing_slash(frontend_base);
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        base
    } else {
        format!("{base}{path}")
    }
}
