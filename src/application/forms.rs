//! Validation of post and comment submissions.
//!
//! Each field resolves to a [`FieldValue`]; the per-field results are then
//! collected into either a validated payload or a set of field messages.

use std::path::Path;

use bytes::Bytes;
use imagesize::ImageType;

use crate::domain::posts::normalize_text;

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_CHOICE_MESSAGE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE_MESSAGE: &str = "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const EMPTY_FILE_MESSAGE: &str = "The submitted file is empty.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<T> {
    Valid(T),
    Invalid(String),
}

impl<T> FieldValue<T> {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FieldValue::Valid(_) => None,
            FieldValue::Invalid(message) => Some(message),
        }
    }

    pub fn into_valid(self) -> Option<T> {
        match self {
            FieldValue::Valid(value) => Some(value),
            FieldValue::Invalid(_) => None,
        }
    }
}

/// A file part as it arrived in the request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Raw post form input, before validation.
#[derive(Debug, Clone, Default)]
pub struct PostSubmission {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<ImageUpload>,
    pub clear_image: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidImage {
    pub filename: String,
    pub data: Bytes,
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageChange {
    Keep,
    Clear,
    Replace(ValidImage),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: ImageChange,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFormErrors {
    pub text: Option<String>,
    pub group: Option<String>,
    pub image: Option<String>,
}

impl PostFormErrors {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.group.is_none() && self.image.is_none()
    }
}

/// Submitted values echoed back when a form is redisplayed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFormData {
    pub text: String,
    pub group: Option<String>,
    pub errors: PostFormErrors,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFormFields {
    pub text: FieldValue<String>,
    pub group: FieldValue<Option<i64>>,
    pub image: FieldValue<ImageChange>,
}

impl PostFormFields {
    pub fn collect(self) -> Result<ValidPost, PostFormErrors> {
        let errors = PostFormErrors {
            text: self.text.error().map(str::to_string),
            group: self.group.error().map(str::to_string),
            image: self.image.error().map(str::to_string),
        };

        match (self.text, self.group, self.image) {
            (FieldValue::Valid(text), FieldValue::Valid(group_id), FieldValue::Valid(image)) => {
                Ok(ValidPost {
                    text,
                    group_id,
                    image,
                })
            }
            _ => Err(errors),
        }
    }
}

pub fn validate_text(raw: &str) -> FieldValue<String> {
    match normalize_text(raw) {
        Ok(text) => FieldValue::Valid(text),
        Err(_) => FieldValue::invalid(REQUIRED_MESSAGE),
    }
}

/// Parse the group selector. Blank means "no group"; existence is checked later.
pub fn parse_group_choice(raw: Option<&str>) -> FieldValue<Option<i64>> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => FieldValue::Valid(None),
        Some(value) => match value.parse::<i64>() {
            Ok(id) => FieldValue::Valid(Some(id)),
            Err(_) => FieldValue::invalid(INVALID_CHOICE_MESSAGE),
        },
    }
}

/// A new upload replaces the current image; otherwise `clear` decides.
pub fn validate_image(upload: Option<ImageUpload>, clear: bool) -> FieldValue<ImageChange> {
    let Some(upload) = upload else {
        return FieldValue::Valid(if clear {
            ImageChange::Clear
        } else {
            ImageChange::Keep
        });
    };

    if upload.data.is_empty() {
        return FieldValue::invalid(EMPTY_FILE_MESSAGE);
    }

    let Some(extension) = imagesize::image_type(&upload.data)
        .ok()
        .and_then(image_extension)
    else {
        return FieldValue::invalid(INVALID_IMAGE_MESSAGE);
    };

    match imagesize::blob_size(&upload.data) {
        Ok(size) if size.width > 0 && size.height > 0 => {
            FieldValue::Valid(ImageChange::Replace(ValidImage {
                filename: image_filename(&upload.filename, extension),
                data: upload.data,
                width: size.width,
                height: size.height,
            }))
        }
        _ => FieldValue::invalid(INVALID_IMAGE_MESSAGE),
    }
}

/// Extension stored for a detected image format. Formats browsers cannot show are refused.
fn image_extension(kind: ImageType) -> Option<&'static str> {
    match kind {
        ImageType::Gif => Some("gif"),
        ImageType::Jpeg => Some("jpg"),
        ImageType::Png => Some("png"),
        ImageType::Webp => Some("webp"),
        ImageType::Bmp => Some("bmp"),
        ImageType::Ico => Some("ico"),
        _ => None,
    }
}

/// Keep the client's stem but replace its extension with the detected one.
fn image_filename(original: &str, extension: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|value| value.to_str())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("upload");
    format!("{stem}.{extension}")
}

pub fn validate_comment(raw: &str) -> FieldValue<String> {
    validate_text(raw)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SMALL_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
        0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
    ];

    fn upload(data: &'static [u8]) -> ImageUpload {
        ImageUpload {
            filename: "small.gif".to_string(),
            content_type: Some("image/gif".to_string()),
            data: Bytes::from_static(data),
        }
    }

    #[test]
    fn text_is_trimmed_and_required() {
        assert_eq!(validate_text("  Hi  "), FieldValue::Valid("Hi".to_string()));
        assert_eq!(validate_text("   ").error(), Some(REQUIRED_MESSAGE));
    }

    #[test]
    fn group_choice_parses_ids() {
        assert_eq!(parse_group_choice(None), FieldValue::Valid(None));
        assert_eq!(parse_group_choice(Some("")), FieldValue::Valid(None));
        assert_eq!(parse_group_choice(Some(" 4 ")), FieldValue::Valid(Some(4)));
        assert_eq!(
            parse_group_choice(Some("cats")).error(),
            Some(INVALID_CHOICE_MESSAGE)
        );
    }

    #[test]
    fn image_accepts_real_gif() {
        match validate_image(Some(upload(SMALL_GIF)), false) {
            FieldValue::Valid(ImageChange::Replace(image)) => {
                assert_eq!((image.width, image.height), (2, 1));
                assert_eq!(image.filename, "small.gif");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn image_extension_follows_detected_format() {
        let disguised = ImageUpload {
            filename: "evil.html".to_string(),
            content_type: Some("text/html".to_string()),
            data: Bytes::from_static(SMALL_GIF),
        };
        match validate_image(Some(disguised), false) {
            FieldValue::Valid(ImageChange::Replace(image)) => {
                assert_eq!(image.filename, "evil.gif");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        assert_eq!(image_filename("", "png"), "upload.png");
        assert_eq!(image_filename("photo", "jpg"), "photo.jpg");
    }

    #[test]
    fn image_rejects_garbage_and_empty_payloads() {
        assert_eq!(
            validate_image(Some(upload(b"definitely not an image")), false).error(),
            Some(INVALID_IMAGE_MESSAGE)
        );
        assert_eq!(
            validate_image(Some(upload(b"")), false).error(),
            Some(EMPTY_FILE_MESSAGE)
        );
    }

    #[test]
    fn image_absent_keeps_or_clears() {
        assert_eq!(validate_image(None, false), FieldValue::Valid(ImageChange::Keep));
        assert_eq!(validate_image(None, true), FieldValue::Valid(ImageChange::Clear));
        assert!(matches!(
            validate_image(Some(upload(SMALL_GIF)), true),
            FieldValue::Valid(ImageChange::Replace(_))
        ));
    }

    #[test]
    fn collect_reports_every_invalid_field() {
        let fields = PostFormFields {
            text: validate_text(""),
            group: parse_group_choice(Some("x")),
            image: FieldValue::Valid(ImageChange::Keep),
        };
        let errors = fields.collect().unwrap_err();
        assert_eq!(errors.text.as_deref(), Some(REQUIRED_MESSAGE));
        assert_eq!(errors.group.as_deref(), Some(INVALID_CHOICE_MESSAGE));
        assert!(errors.image.is_none());
        assert!(!errors.is_empty());
    }

    #[test]
    fn collect_yields_valid_post() {
        let fields = PostFormFields {
            text: validate_text("Body"),
            group: parse_group_choice(Some("2")),
            image: FieldValue::Valid(ImageChange::Clear),
        };
        assert_eq!(
            fields.collect().unwrap(),
            ValidPost {
                text: "Body".to_string(),
                group_id: Some(2),
                image: ImageChange::Clear,
            }
        );
    }
}
