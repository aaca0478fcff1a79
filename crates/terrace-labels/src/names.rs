//! Label name validation.
//!
//! Label names double as file names in directory-backed stores, so they are
//! restricted to a portable subset:
//! - Must be non-empty and at most 200 bytes
//! - Only ASCII letters, digits, `-`, `_` and `.`
//! - Must not start with `.`
//! - Must not end with `.tmp` or `.label`

use crate::error::{LabelError, Result};

/// Longest accepted label name, in bytes.
pub const MAX_LABEL_NAME_LEN: usize = 200;

fn invalid(name: &str, reason: impl Into<String>) -> LabelError {
    LabelError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a label name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use terrace_labels::names::validate_label_name;
///
/// assert!(validate_label_name("people").is_ok());
/// assert!(validate_label_name("people-v2.draft").is_ok());
/// assert!(validate_label_name("").is_err());
/// assert!(validate_label_name("../escape").is_err());
/// ```
pub fn validate_label_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "label name must not be empty"));
    }
    if name.len() > MAX_LABEL_NAME_LEN {
        return Err(invalid(
            name,
            format!("longer than {MAX_LABEL_NAME_LEN} bytes"),
        ));
    }
    if let Some(ch) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }
    if name.starts_with('.') {
        return Err(invalid(name, "must not start with '.'"));
    }
    if name.ends_with(".tmp") || name.ends_with(".label") {
        return Err(invalid(name, "must not end with '.tmp' or '.label'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_names() {
        for name in ["main", "graph_1", "a.b-c", "X"] {
            assert!(validate_label_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_path_like_names() {
        for name in ["a/b", "..", ".hidden", "a\\b", "with space", "tab\tname"] {
            assert!(validate_label_name(name).is_err(), "{name}");
        }
    }

    #[test]
    fn rejects_reserved_suffixes() {
        assert!(validate_label_name("x.tmp").is_err());
        assert!(validate_label_name("x.label").is_err());
    }

    #[test]
    fn rejects_overlong_names() {
        let name = "a".repeat(MAX_LABEL_NAME_LEN + 1);
        assert!(matches!(
            validate_label_name(&name),
            Err(LabelError::InvalidName { .. })
        ));
        assert!(validate_label_name(&"a".repeat(MAX_LABEL_NAME_LEN)).is_ok());
    }

    #[test]
    fn rejects_non_ascii() {
        assert!(validate_label_name("graphé").is_err());
    }
}
