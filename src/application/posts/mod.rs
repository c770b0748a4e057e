mod commands;
mod queries;
mod service;
pub mod types;

pub use service::*;
pub use types::{
    CommentOutcome, CreateOutcome, EditAccess, EditOutcome, GroupFeed, METRIC_COMMENTS_CREATED,
    METRIC_FORM_REJECTED, METRIC_POSTS_CREATED, METRIC_POSTS_UPDATED, PostDetail, PostError,
    ProfileFeed,
};
