use thiserror::Error;

use crate::application::forms::PostFormData;
use crate::application::media::MediaError;
use crate::application::pagination::Page;
use crate::application::repos::RepoError;
use crate::domain::entities::{
    CommentEntry, CommentRecord, GroupRecord, PostEntry, PostRecord, UserRecord,
};

pub const METRIC_POSTS_CREATED: &str = "scribe_posts_created_total";
pub const METRIC_POSTS_UPDATED: &str = "scribe_posts_updated_total";
pub const METRIC_COMMENTS_CREATED: &str = "scribe_comments_created_total";
pub const METRIC_FORM_REJECTED: &str = "scribe_form_rejected_total";

#[derive(Debug, Error)]
pub enum PostError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Media(#[from] MediaError),
}

impl PostError {
    pub(crate) fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }
}

#[derive(Debug, Clone)]
pub struct GroupFeed {
    pub group: GroupRecord,
    pub page: Page<PostEntry>,
}

#[derive(Debug, Clone)]
pub struct ProfileFeed {
    pub author: UserRecord,
    pub post_count: u64,
    pub page: Page<PostEntry>,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub entry: PostEntry,
    pub author_post_count: u64,
    pub comments: Vec<CommentEntry>,
}

#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Created(PostRecord),
    Rejected(PostFormData),
}

#[derive(Debug, Clone)]
pub enum EditAccess {
    Granted(PostEntry),
    Denied,
}

#[derive(Debug, Clone)]
pub enum EditOutcome {
    Updated(PostRecord),
    Rejected { entry: PostEntry, form: PostFormData },
    Denied,
}

#[derive(Debug, Clone)]
pub enum CommentOutcome {
    Created(CommentRecord),
    Dropped { reason: String },
}
