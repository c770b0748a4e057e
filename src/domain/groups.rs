//! Group creation rules.

use crate::domain::{
    error::DomainError,
    slug::{derive_slug, validate_slug},
};

pub const TITLE_MAX_CHARS: usize = 200;

/// A validated group ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl NewGroup {
    /// Validate the title and slug. A missing slug is derived from the title.
    pub fn new(
        title: &str,
        slug: Option<&str>,
        description: Option<&str>,
    ) -> Result<Self, DomainError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("group title must not be empty"));
        }
        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(DomainError::validation(format!(
                "group title must be at most {TITLE_MAX_CHARS} characters"
            )));
        }

        let slug = match slug.map(str::trim) {
            Some(explicit) => {
                validate_slug(explicit).map_err(|err| DomainError::validation(err.to_string()))?;
                explicit.to_string()
            }
            None => derive_slug(title).map_err(|err| DomainError::validation(err.to_string()))?,
        };

        Ok(Self {
            title: title.to_string(),
            slug,
            description: description.map(str::trim).unwrap_or_default().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_slug_when_missing() {
        let group = NewGroup::new("Night Owls", None, None).unwrap();
        assert_eq!(group.slug, "night-owls");
        assert_eq!(group.description, "");
    }

    #[test]
    fn keeps_explicit_slug() {
        let group = NewGroup::new("Test group", Some("test-slug"), Some(" about ")).unwrap();
        assert_eq!(group.slug, "test-slug");
        assert_eq!(group.description, "about");
    }

    #[test]
    fn rejects_overlong_title() {
        let title = "x".repeat(TITLE_MAX_CHARS + 1);
        assert!(NewGroup::new(&title, Some("x"), None).is_err());
        let title = "x".repeat(TITLE_MAX_CHARS);
        assert!(NewGroup::new(&title, Some("x"), None).is_ok());
    }

    #[test]
    fn rejects_malformed_slug() {
        assert!(NewGroup::new("Title", Some("bad slug"), None).is_err());
    }
}
