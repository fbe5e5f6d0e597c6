//! `Link` header parsing.
//!
//! Paginated responses name their related pages with RFC 8288 links such
//! as `<./stats?start=2024-03-07&limit=1>; rel="next"`. Targets are
//! resolved against the URL of the request that produced the response and
//! turned back into [`PageRequest`]s. Relations this crate does not know
//! (`prev`, `last`, ...) are skipped.

use reqwest::Url;

use crate::error::FetchError;
use crate::pagination::{PageRequest, Param, Relation, RelativeLinks};

/// Parses every `Link` header value into relative links.
///
/// # Errors
///
/// Returns [`FetchError::InvalidLink`] if an entry is malformed or its
/// target cannot be resolved against `base`.
pub fn parse_link_headers<'a>(
    values: impl IntoIterator<Item = &'a str>,
    base: &Url,
) -> Result<RelativeLinks<PageRequest>, FetchError> {
    let mut links = RelativeLinks::new();
    for value in values {
        for entry in split_entries(value) {
            let (target, relations) = parse_entry(entry)?;
            let known: Vec<Relation> = relations
                .split_whitespace()
                .filter_map(|name| name.parse().ok())
                .collect();
            if known.is_empty() {
                continue;
            }
            let request = resolve(base, target)?;
            for relation in known {
                links.set(relation, request.clone());
            }
        }
    }
    Ok(links)
}

/// Splits a header value on commas that are not inside `<...>`.
fn split_entries(value: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut from = 0;
    for (i, c) in value.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                entries.extend(value.get(from..i));
                from = i + 1;
            }
            _ => {}
        }
    }
    entries.extend(value.get(from..));
    entries
        .into_iter()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .collect()
}

/// Returns `(target, rel)` for one `<target>; rel="..."` entry.
fn parse_entry(entry: &str) -> Result<(&str, &str), FetchError> {
    let invalid = || FetchError::InvalidLink(entry.to_string());
    let rest = entry.strip_prefix('<').ok_or_else(invalid)?;
    let (target, params) = rest.split_once('>').ok_or_else(invalid)?;
    let rel = params
        .split(';')
        .filter_map(|p| p.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("rel"))
        .map(|(_, value)| value.trim().trim_matches('"'))
        .ok_or_else(invalid)?;
    Ok((target.trim(), rel))
}

fn resolve(base: &Url, target: &str) -> Result<PageRequest, FetchError> {
    let url = base
        .join(target)
        .map_err(|e| FetchError::InvalidLink(format!("{target}: {e}")))?;
    let params = url
        .query_pairs()
        .map(|(key, value)| Param::new(key, value))
        .collect();
    Ok(PageRequest::with_params(url.path(), params))
}
