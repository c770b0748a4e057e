use std::sync::Arc;

use crate::application::media::MediaStore;
use crate::application::pagination::Paginator;
use crate::application::repos::{
    CommentsRepo, GroupsRepo, PostsRepo, PostsWriteRepo, UsersRepo,
};

#[derive(Clone)]
pub struct PostService {
    pub(crate) users: Arc<dyn UsersRepo>,
    pub(crate) groups: Arc<dyn GroupsRepo>,
    pub(crate) reader: Arc<dyn PostsRepo>,
    pub(crate) writer: Arc<dyn PostsWriteRepo>,
    pub(crate) comments: Arc<dyn CommentsRepo>,
    pub(crate) media: Arc<dyn MediaStore>,
    pub(crate) paginator: Paginator,
}

impl PostService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        groups: Arc<dyn GroupsRepo>,
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        comments: Arc<dyn CommentsRepo>,
        media: Arc<dyn MediaStore>,
        paginator: Paginator,
    ) -> Self {
        Self {
            users,
            groups,
            reader,
            writer,
            comments,
            media,
            paginator,
        }
    }

    pub fn paginator(&self) -> Paginator {
        self.paginator
    }
}
