//! Keyword-driven column-pair extraction.
//!
//! Pulls two candidate column identifiers out of free text shaped like
//! "plot A vs B". Candidates are not validated here; membership in the
//! dataset's actual column set is a separate, mandatory check performed by
//! the caller before any chart is produced.

use crate::{Result, TabchatError};

/// Extract a `(x, y)` candidate pair from free text.
///
/// The text is lowercased, the substring after the first occurrence of
/// `trigger` (as a whole word) is split on the first whole-word occurrence
/// of `separator`, and both halves are trimmed. Pure and idempotent.
///
/// Fails with [`TabchatError::ExtractionFailure`] when the trigger or
/// separator is absent or either half comes back empty; callers surface
/// that as a user-visible message and the session continues.
pub fn extract_column_pair(
    text: &str,
    trigger: &str,
    separator: &str,
) -> Result<(String, String)> {
    let lowered = text.to_lowercase();

    let trigger_at = find_word(&lowered, trigger).ok_or_else(|| {
        TabchatError::ExtractionFailure(format!("no '{}' keyword in request", trigger))
    })?;
    let after_trigger = &lowered[trigger_at + trigger.len()..];

    let separator_at = find_word(after_trigger, separator).ok_or_else(|| {
        TabchatError::ExtractionFailure(format!(
            "no '{}' between the column names",
            separator
        ))
    })?;

    let first = after_trigger[..separator_at].trim();
    let second = after_trigger[separator_at + separator.len()..].trim();

    if first.is_empty() || second.is_empty() {
        return Err(TabchatError::ExtractionFailure(
            "a column name is missing on one side".to_string(),
        ));
    }

    Ok((first.to_string(), second.to_string()))
}

/// Find `needle` in `haystack` at word boundaries.
///
/// Keeps "vs" from matching inside "oversight" or "plot" inside "plotting".
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }

    let bytes = haystack.as_bytes();
    let mut from = 0;
    while let Some(rel) = haystack[from..].find(needle) {
        let at = from + rel;
        let end = at + needle.len();
        let boundary_before = at == 0 || !bytes[at - 1].is_ascii_alphanumeric();
        let boundary_after = end == bytes.len() || !bytes[end].is_ascii_alphanumeric();
        if boundary_before && boundary_after {
            return Some(at);
        }
        from = at + 1;
    }
    None
}
