use metrics::counter;

use crate::application::forms::{
    FieldValue, INVALID_CHOICE_MESSAGE, ImageChange, PostFormData, PostFormFields,
    PostSubmission, ValidPost, parse_group_choice, validate_comment, validate_image,
    validate_text,
};
use crate::application::repos::{CreateCommentParams, CreatePostParams, UpdatePostParams};
use crate::domain::entities::UserRecord;
use crate::domain::posts::IMAGE_UPLOAD_PREFIX;

use super::service::PostService;
use super::types::{
    CommentOutcome, CreateOutcome, EditAccess, EditOutcome, METRIC_COMMENTS_CREATED,
    METRIC_FORM_REJECTED, METRIC_POSTS_CREATED, METRIC_POSTS_UPDATED, PostError,
};

impl PostService {
    /// Create a post authored by `author`. Nothing is stored when validation fails.
    pub async fn create_post(
        &self,
        author: &UserRecord,
        submission: PostSubmission,
    ) -> Result<CreateOutcome, PostError> {
        let post = match self.validate_submission(submission).await? {
            Ok(post) => post,
            Err(form) => {
                counter!(METRIC_FORM_REJECTED, "form" => "post").increment(1);
                return Ok(CreateOutcome::Rejected(form));
            }
        };

        let image = self.apply_image(post.image, None).await?;
        let params = CreatePostParams {
            author_id: author.id,
            text: post.text,
            group_id: post.group_id,
            image: image.clone(),
        };

        let record = match self.writer.create_post(params).await {
            Ok(record) => record,
            Err(err) => {
                if let Some(stored) = image {
                    self.discard_upload(&stored).await;
                }
                return Err(err.into());
            }
        };

        counter!(METRIC_POSTS_CREATED).increment(1);
        tracing::info!(
            target = "scribe::application::posts",
            post_id = record.id,
            author = %author.username,
            "Post created"
        );
        Ok(CreateOutcome::Created(record))
    }

    /// Load a post for editing. Only its author is granted access.
    pub async fn edit_access(&self, viewer: &UserRecord, id: i64) -> Result<EditAccess, PostError> {
        let entry = self
            .reader
            .find_post_by_id(id)
            .await?
            .ok_or_else(|| PostError::not_found("post"))?;
        if entry.post.author_id != viewer.id {
            return Ok(EditAccess::Denied);
        }
        Ok(EditAccess::Granted(entry))
    }

    pub async fn update_post(
        &self,
        viewer: &UserRecord,
        id: i64,
        submission: PostSubmission,
    ) -> Result<EditOutcome, PostError> {
        let entry = match self.edit_access(viewer, id).await? {
            EditAccess::Granted(entry) => entry,
            EditAccess::Denied => {
                tracing::info!(
                    target = "scribe::application::posts",
                    post_id = id,
                    viewer = %viewer.username,
                    "Edit refused for non-author"
                );
                return Ok(EditOutcome::Denied);
            }
        };

        let post = match self.validate_submission(submission).await? {
            Ok(post) => post,
            Err(form) => {
                counter!(METRIC_FORM_REJECTED, "form" => "post").increment(1);
                return Ok(EditOutcome::Rejected { entry, form });
            }
        };

        let replaced = matches!(post.image, ImageChange::Replace(_));
        let image = self
            .apply_image(post.image, entry.post.image.clone())
            .await?;
        let params = UpdatePostParams {
            id,
            text: post.text,
            group_id: post.group_id,
            image: image.clone(),
        };

        let record = match self.writer.update_post(params).await {
            Ok(record) => record,
            Err(err) => {
                if replaced && let Some(stored) = image {
                    self.discard_upload(&stored).await;
                }
                return Err(err.into());
            }
        };

        // The previous file is unreferenced once it was replaced or cleared.
        if let Some(previous) = entry.post.image.as_deref()
            && record.image.as_deref() != Some(previous)
        {
            self.discard_upload(previous).await;
        }

        counter!(METRIC_POSTS_UPDATED).increment(1);
        tracing::info!(
            target = "scribe::application::posts",
            post_id = record.id,
            "Post updated"
        );
        Ok(EditOutcome::Updated(record))
    }

    /// Attach a comment to an existing post. Invalid text is dropped, not reported.
    pub async fn add_comment(
        &self,
        viewer: &UserRecord,
        post_id: i64,
        text: &str,
    ) -> Result<CommentOutcome, PostError> {
        let entry = self
            .reader
            .find_post_by_id(post_id)
            .await?
            .ok_or_else(|| PostError::not_found("post"))?;

        let text = match validate_comment(text) {
            FieldValue::Valid(text) => text,
            FieldValue::Invalid(reason) => {
                counter!(METRIC_FORM_REJECTED, "form" => "comment").increment(1);
                tracing::warn!(
                    target = "scribe::application::posts",
                    post_id,
                    viewer = %viewer.username,
                    reason = %reason,
                    "Comment dropped"
                );
                return Ok(CommentOutcome::Dropped { reason });
            }
        };

        let comment = self
            .comments
            .create_comment(CreateCommentParams {
                post_id: entry.post.id,
                author_id: viewer.id,
                text,
            })
            .await?;

        counter!(METRIC_COMMENTS_CREATED).increment(1);
        Ok(CommentOutcome::Created(comment))
    }

    async fn validate_submission(
        &self,
        submission: PostSubmission,
    ) -> Result<Result<ValidPost, PostFormData>, PostError> {
        let text = validate_text(&submission.text);
        let group = match parse_group_choice(submission.group.as_deref()) {
            FieldValue::Valid(Some(group_id)) => {
                if self.groups.find_group_by_id(group_id).await?.is_some() {
                    FieldValue::Valid(Some(group_id))
                } else {
                    FieldValue::invalid(INVALID_CHOICE_MESSAGE)
                }
            }
            other => other,
        };
        let image = validate_image(submission.image, submission.clear_image);

        let fields = PostFormFields { text, group, image };
        Ok(fields.collect().map_err(|errors| PostFormData {
            text: submission.text,
            group: submission.group,
            errors,
        }))
    }

    async fn apply_image(
        &self,
        change: ImageChange,
        current: Option<String>,
    ) -> Result<Option<String>, PostError> {
        match change {
            ImageChange::Keep => Ok(current),
            ImageChange::Clear => Ok(None),
            ImageChange::Replace(image) => {
                let stored = self
                    .media
                    .store(IMAGE_UPLOAD_PREFIX, &image.filename, image.data)
                    .await?;
                Ok(Some(stored))
            }
        }
    }

    async fn discard_upload(&self, stored: &str) {
        if let Err(err) = self.media.delete(stored).await {
            tracing::warn!(
                target = "scribe::application::posts",
                path = stored,
                error = %err,
                "Failed to remove orphaned upload"
            );
        }
    }
}
