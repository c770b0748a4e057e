//! Request body extractors for the authoring forms.

use axum::{
    Form,
    extract::{FromRequest, Request},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
};
use axum_extra::extract::Multipart;
use axum_extra::extract::multipart::MultipartError;
use serde::Deserialize;
use tracing::warn;

use crate::application::error::HttpError;
use crate::application::forms::{ImageUpload, PostSubmission};

const SOURCE: &str = "infra::http::forms";
const CLEAR_IMAGE_FIELD: &str = "image-clear";

/// Post form fields, accepted as either multipart or urlencoded bodies.
pub(super) struct PostSubmissionForm(pub PostSubmission);

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UrlencodedPost {
    text: String,
    group: Option<String>,
    #[serde(rename = "image-clear")]
    image_clear: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct CommentPayload {
    pub text: String,
}

impl<S> FromRequest<S> for PostSubmissionForm
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(req.headers()) {
            let mut multipart = Multipart::from_request(req, state).await.map_err(|rejection| {
                HttpError::new(
                    SOURCE,
                    StatusCode::BAD_REQUEST,
                    "Invalid form submission",
                    rejection.to_string(),
                )
            })?;
            return read_multipart(&mut multipart).await.map(Self);
        }

        let Form(raw) = Form::<UrlencodedPost>::from_request(req, state)
            .await
            .map_err(|rejection| {
                HttpError::new(
                    SOURCE,
                    rejection.status(),
                    "Invalid form submission",
                    rejection.body_text(),
                )
            })?;

        Ok(Self(PostSubmission {
            text: raw.text,
            group: raw.group,
            image: None,
            clear_image: is_checked(raw.image_clear.as_deref()),
        }))
    }
}

/// Read the comment text from a multipart or urlencoded body.
/// An unreadable body yields empty text, which the service drops.
pub(super) async fn read_comment<S>(req: Request, state: &S) -> CommentPayload
where
    S: Send + Sync,
{
    let result = if is_multipart(req.headers()) {
        match Multipart::from_request(req, state).await {
            Ok(mut multipart) => read_comment_multipart(&mut multipart).await,
            Err(rejection) => Err(rejection.to_string()),
        }
    } else {
        Form::<CommentPayload>::from_request(req, state)
            .await
            .map(|Form(payload)| payload)
            .map_err(|rejection| rejection.body_text())
    };

    result.unwrap_or_else(|reason| {
        warn!(
            target = "scribe::http::forms",
            reason = %reason,
            "comment body could not be read"
        );
        CommentPayload::default()
    })
}

async fn read_comment_multipart(multipart: &mut Multipart) -> Result<CommentPayload, String> {
    let mut payload = CommentPayload::default();
    while let Some(field) = multipart.next_field().await.map_err(|err| err.body_text())? {
        if field.name() == Some("text") {
            payload.text = field.text().await.map_err(|err| err.body_text())?;
        }
    }
    Ok(payload)
}

async fn read_multipart(multipart: &mut Multipart) -> Result<PostSubmission, HttpError> {
    let mut submission = PostSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("text") => submission.text = field.text().await.map_err(multipart_error)?,
            Some("group") => {
                submission.group = Some(field.text().await.map_err(multipart_error)?);
            }
            Some(CLEAR_IMAGE_FIELD) => {
                let value = field.text().await.map_err(multipart_error)?;
                submission.clear_image = is_checked(Some(&value));
            }
            Some("image") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|name| !name.trim().is_empty());
                let content_type = field.content_type().map(|mime| mime.to_string());
                let data = field.bytes().await.map_err(multipart_error)?;

                // Browsers send an empty nameless part when no file was chosen.
                if filename.is_none() && data.is_empty() {
                    continue;
                }
                submission.image = Some(ImageUpload {
                    filename: filename.unwrap_or_else(|| "upload".to_string()),
                    content_type,
                    data,
                });
            }
            _ => {}
        }
    }

    Ok(submission)
}

fn multipart_error(err: MultipartError) -> HttpError {
    HttpError::new(
        SOURCE,
        err.status(),
        "Invalid form submission",
        err.body_text(),
    )
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
        .unwrap_or(false)
}

fn is_checked(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(value) => !value.eq_ignore_ascii_case("false"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Method;

    fn urlencoded(body: &'static str) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/create/")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    fn multipart(body: String) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/create/")
            .header(CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn reads_urlencoded_post_fields() {
        let request = urlencoded("text=Hello+there&group=3&image-clear=on");
        let PostSubmissionForm(submission) = PostSubmissionForm::from_request(request, &())
            .await
            .unwrap();

        assert_eq!(submission.text, "Hello there");
        assert_eq!(submission.group.as_deref(), Some("3"));
        assert!(submission.clear_image);
        assert!(submission.image.is_none());
    }

    #[tokio::test]
    async fn missing_urlencoded_fields_default_to_empty() {
        let PostSubmissionForm(submission) =
            PostSubmissionForm::from_request(urlencoded(""), &())
                .await
                .unwrap();
        assert_eq!(submission.text, "");
        assert!(submission.group.is_none());
        assert!(!submission.clear_image);
    }

    #[tokio::test]
    async fn multipart_skips_empty_file_input() {
        let body = [
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"text\"\r\n\r\n",
            "multipart text\r\n",
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"group\"\r\n\r\n",
            "\r\n",
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"image\"; filename=\"\"\r\n",
            "Content-Type: application/octet-stream\r\n\r\n",
            "\r\n",
            "--XBOUNDARY--\r\n",
        ]
        .concat();

        let PostSubmissionForm(submission) = PostSubmissionForm::from_request(multipart(body), &())
            .await
            .unwrap();
        assert_eq!(submission.text, "multipart text");
        assert_eq!(submission.group.as_deref(), Some(""));
        assert!(submission.image.is_none());
    }

    #[tokio::test]
    async fn multipart_keeps_uploaded_file() {
        let body = [
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"text\"\r\n\r\n",
            "with image\r\n",
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"image\"; filename=\"pic.gif\"\r\n",
            "Content-Type: image/gif\r\n\r\n",
            "GIF89a\r\n",
            "--XBOUNDARY--\r\n",
        ]
        .concat();

        let PostSubmissionForm(submission) = PostSubmissionForm::from_request(multipart(body), &())
            .await
            .unwrap();
        let image = submission.image.expect("image part");
        assert_eq!(image.filename, "pic.gif");
        assert_eq!(image.content_type.as_deref(), Some("image/gif"));
        assert_eq!(&image.data[..], b"GIF89a");
    }

    #[tokio::test]
    async fn reads_multipart_comment() {
        let body = [
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"text\"\r\n\r\n",
            "Multipart comment\r\n",
            "--XBOUNDARY--\r\n",
        ]
        .concat();
        let payload = read_comment(multipart(body), &()).await;
        assert_eq!(payload.text, "Multipart comment");
    }

    #[tokio::test]
    async fn unreadable_comment_body_is_empty() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/posts/1/comment/")
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from("hello"))
            .unwrap();
        let payload = read_comment(request, &()).await;
        assert_eq!(payload.text, "");
    }

    #[test]
    fn checkbox_values() {
        assert!(is_checked(Some("on")));
        assert!(is_checked(Some("true")));
        assert!(!is_checked(Some("false")));
        assert!(!is_checked(Some("")));
        assert!(!is_checked(None));
    }
}
