//! Slug helpers for group addresses.

use slug::slugify;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("`{input}` is not a valid slug; use letters, digits, `-` or `_`")]
    Malformed { input: String },
}

/// Derive a slug from a human-readable title.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Check an operator-supplied slug. ASCII letters, digits, `-` and `_` only.
pub fn validate_slug(input: &str) -> Result<(), SlugError> {
    if input.is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let well_formed = input
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !well_formed {
        return Err(SlugError::Malformed {
            input: input.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_ascii_slug() {
        assert_eq!(derive_slug("Cats & Dogs").unwrap(), "cats-dogs");
    }

    #[test]
    fn derive_rejects_empty_input() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
    }

    #[test]
    fn validate_accepts_underscores_and_case() {
        assert!(validate_slug("Test_slug-2").is_ok());
    }

    #[test]
    fn validate_rejects_separators() {
        assert!(matches!(
            validate_slug("a/b"),
            Err(SlugError::Malformed { .. })
        ));
        assert!(matches!(
            validate_slug("with space"),
            Err(SlugError::Malformed { .. })
        ));
    }
}
