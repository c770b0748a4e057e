use crate::application::pagination::Page;
use crate::application::repos::PostFilter;
use crate::domain::entities::{GroupRecord, PostEntry};

use super::service::PostService;
use super::types::{GroupFeed, PostDetail, PostError, ProfileFeed};

impl PostService {
    pub async fn index(&self, page: Option<&str>) -> Result<Page<PostEntry>, PostError> {
        self.page_of(PostFilter::All, page).await
    }

    pub async fn group_feed(&self, slug: &str, page: Option<&str>) -> Result<GroupFeed, PostError> {
        let group = self
            .groups
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| PostError::not_found("group"))?;
        let page = self.page_of(PostFilter::Group(group.id), page).await?;
        Ok(GroupFeed { group, page })
    }

    pub async fn profile(&self, username: &str, page: Option<&str>) -> Result<ProfileFeed, PostError> {
        let author = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| PostError::not_found("user"))?;
        let page = self.page_of(PostFilter::Author(author.id), page).await?;
        Ok(ProfileFeed {
            author,
            post_count: page.window.total,
            page,
        })
    }

    pub async fn post_detail(&self, id: i64) -> Result<PostDetail, PostError> {
        let entry = self
            .reader
            .find_post_by_id(id)
            .await?
            .ok_or_else(|| PostError::not_found("post"))?;
        let author_post_count = self
            .reader
            .count_posts(PostFilter::Author(entry.post.author_id))
            .await?;
        let comments = self.comments.list_comments_for_post(id).await?;
        Ok(PostDetail {
            entry,
            author_post_count,
            comments,
        })
    }

    pub async fn list_groups(&self) -> Result<Vec<GroupRecord>, PostError> {
        Ok(self.groups.list_groups().await?)
    }

    async fn page_of(
        &self,
        filter: PostFilter,
        requested: Option<&str>,
    ) -> Result<Page<PostEntry>, PostError> {
        let total = self.reader.count_posts(filter).await?;
        let window = self.paginator.window(total, requested);
        let items = if total == 0 {
            Vec::new()
        } else {
            self.reader.list_posts(filter, window).await?
        };
        Ok(Page::new(items, window))
    }
}
