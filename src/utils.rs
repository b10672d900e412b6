// src/utils.rs
use serde::{Deserialize, Deserializer};

/// Trimmed view of an optional string, `None` when blank
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Owned, trimmed copy of an optional string, `None` when blank
pub fn non_empty_owned(value: Option<&str>) -> Option<String> {
    non_empty(value).map(str::to_string)
}

/// First entry of a list that is not blank
pub fn first_non_empty(values: &[String]) -> Option<String> {
    values
        .iter()
        .find_map(|v| non_empty(Some(v.as_str())))
        .map(str::to_string)
}

/// Collapse runs of whitespace into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// First eight characters of an id, for filenames and log lines
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Vendors send `null` for empty lists as often as they omit them
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
