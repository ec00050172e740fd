//! Tag name and color validation shared by every tag store.

use crate::defaults::{TAG_COLOR_MAX_LEN, TAG_NAME_MAX_LEN};

/// Validate and normalize a tag name.
///
/// Rules:
/// - Surrounding whitespace is trimmed
/// - Length between 1 and 100 characters after trimming
/// - No control characters
///
/// Returns the trimmed name, or a message describing the violation.
pub fn validate_tag_name(name: &str) -> std::result::Result<String, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Tag name cannot be empty".to_string());
    }
    if trimmed.chars().count() > TAG_NAME_MAX_LEN {
        return Err(format!(
            "Tag name must be {} characters or less",
            TAG_NAME_MAX_LEN
        ));
    }
    if trimmed.chars().any(char::is_control) {
        return Err("Tag name cannot contain control characters".to_string());
    }
    Ok(trimmed.to_string())
}

/// Validate an optional display color. Empty strings clear the color.
pub fn validate_tag_color(color: Option<&str>) -> std::result::Result<Option<String>, String> {
    match color.map(str::trim) {
        None | Some("") => Ok(None),
        Some(c) if c.chars().count() > TAG_COLOR_MAX_LEN => Err(format!(
            "Tag color must be {} characters or less",
            TAG_COLOR_MAX_LEN
        )),
        Some(c) => Ok(Some(c.to_string())),
    }
}
