//! Post invariants and field metadata shared by forms and templates.

use crate::domain::error::DomainError;

/// Number of characters a post contributes to its string form.
pub const PREVIEW_CHARS: usize = 15;

/// Media sub-directory every post image is stored below.
pub const IMAGE_UPLOAD_PREFIX: &str = "posts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    pub name: &'static str,
    pub label: &'static str,
    pub help_text: &'static str,
}

pub const TEXT_FIELD: FieldMeta = FieldMeta {
    name: "text",
    label: "Post text",
    help_text: "Text of the new post",
};

pub const GROUP_FIELD: FieldMeta = FieldMeta {
    name: "group",
    label: "Group",
    help_text: "Group the post will belong to",
};

pub const IMAGE_FIELD: FieldMeta = FieldMeta {
    name: "image",
    label: "Image",
    help_text: "Image attached to the post",
};

pub const COMMENT_FIELD: FieldMeta = FieldMeta {
    name: "text",
    label: "Comment",
    help_text: "Text of the comment",
};

/// First [`PREVIEW_CHARS`] characters of a post body.
pub fn text_preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// Trim surrounding whitespace and reject bodies that end up empty.
pub fn normalize_text(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("text must not be empty"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_counts_characters_not_bytes() {
        assert_eq!(text_preview("short"), "short");
        assert_eq!(text_preview("Тестовый пост для проверки"), "Тестовый пост д");
    }

    #[test]
    fn normalize_text_trims_and_rejects_blank() {
        assert_eq!(normalize_text("  hello \n").unwrap(), "hello");
        assert!(matches!(
            normalize_text(" \t\n"),
            Err(DomainError::Validation { .. })
        ));
    }
}
