use crate::application::{
    auth::Viewer,
    error::{ErrorReport, HttpError},
    forms::{PostFormData, PostFormErrors},
    pagination::{Page, PageWindow},
};
use crate::domain::{
    entities::{CommentEntry, GroupRecord, PostEntry},
    posts::{COMMENT_FIELD, FieldMeta, GROUP_FIELD, IMAGE_FIELD, TEXT_FIELD},
};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};

const SITE_TITLE: &str = "Scribe";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let view = LayoutContext::new(chrome.titled("Page not found"), ErrorPageView::not_found());
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// Render an error page for `error`, keeping its report for the response logger.
pub fn render_error_response(chrome: LayoutChrome, error: HttpError) -> Response {
    let status = error.status();
    let content = ErrorPageView::from_status(status, error.public_message());
    let view = LayoutContext::new(chrome.titled(&content.title), content);
    let mut response = render_template_response(ErrorTemplate { view }, status);
    error.into_report().attach(&mut response);
    response
}

#[derive(Clone)]
pub struct BrandView {
    pub title: String,
    pub href: String,
}

#[derive(Clone)]
pub struct ViewerView {
    pub username: String,
    pub display_name: String,
    pub profile_href: String,
}

#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: BrandView,
    pub viewer: Option<ViewerView>,
    pub page_title: String,
}

impl LayoutChrome {
    pub fn for_viewer(viewer: &Viewer) -> Self {
        Self {
            brand: BrandView {
                title: SITE_TITLE.to_string(),
                href: "/".to_string(),
            },
            viewer: viewer.user().map(|user| ViewerView {
                username: user.username.clone(),
                display_name: user.display_name(),
                profile_href: profile_href(&user.username),
            }),
            page_title: SITE_TITLE.to_string(),
        }
    }

    pub fn titled(self, title: &str) -> Self {
        Self {
            page_title: format!("{title} | {SITE_TITLE}"),
            ..self
        }
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub brand: BrandView,
    pub viewer: Option<ViewerView>,
    pub page_title: String,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            brand: chrome.brand,
            viewer: chrome.viewer,
            page_title: chrome.page_title,
            content,
        }
    }
}

#[derive(Clone)]
pub struct GroupLink {
    pub title: String,
    pub href: String,
}

#[derive(Clone)]
pub struct PostCard {
    pub id: i64,
    pub text: String,
    pub detail_href: String,
    pub author_username: String,
    pub author_name: String,
    pub author_href: String,
    pub iso_date: String,
    pub published: String,
    pub group: Option<GroupLink>,
    pub image_url: Option<String>,
}

impl PostCard {
    pub fn from_entry(entry: &PostEntry) -> Self {
        let post = &entry.post;
        Self {
            id: post.id,
            text: post.text.clone(),
            detail_href: post_href(post.id),
            author_username: entry.author.username.clone(),
            author_name: entry.author.full_name.clone(),
            author_href: profile_href(&entry.author.username),
            iso_date: iso_date(post.created_at),
            published: human_date(post.created_at),
            group: entry.group.as_ref().map(|group| GroupLink {
                title: group.title.clone(),
                href: group_href(&group.slug),
            }),
            image_url: post.image.as_deref().map(media_href),
        }
    }
}

pub fn build_post_cards(page: &Page<PostEntry>) -> Vec<PostCard> {
    page.items.iter().map(PostCard::from_entry).collect()
}

#[derive(Clone)]
pub struct PaginatorView {
    pub number: u64,
    pub num_pages: u64,
    pub first_href: Option<String>,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
    pub last_href: Option<String>,
}

impl PaginatorView {
    pub fn from_window(window: &PageWindow) -> Self {
        Self {
            number: window.number,
            num_pages: window.num_pages,
            first_href: window.has_previous().then(|| page_href(1)),
            previous_href: window.previous_number().map(page_href),
            next_href: window.next_number().map(page_href),
            last_href: window.has_next().then(|| page_href(window.num_pages)),
        }
    }

    pub fn is_paginated(&self) -> bool {
        self.num_pages > 1
    }
}

pub struct FeedContext {
    pub heading: String,
    pub posts: Vec<PostCard>,
    pub paginator: PaginatorView,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<FeedContext>,
}

pub struct GroupContext {
    pub title: String,
    pub description: String,
    pub posts: Vec<PostCard>,
    pub paginator: PaginatorView,
}

#[derive(Template)]
#[template(path = "group_list.html")]
pub struct GroupTemplate {
    pub view: LayoutContext<GroupContext>,
}

pub struct ProfileContext {
    pub username: String,
    pub display_name: String,
    pub post_count: u64,
    pub posts: Vec<PostCard>,
    pub paginator: PaginatorView,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub view: LayoutContext<ProfileContext>,
}

#[derive(Clone)]
pub struct CommentView {
    pub text: String,
    pub author_username: String,
    pub author_href: String,
    pub iso_date: String,
    pub published: String,
}

impl CommentView {
    pub fn from_entry(entry: &CommentEntry) -> Self {
        Self {
            text: entry.comment.text.clone(),
            author_username: entry.author.username.clone(),
            author_href: profile_href(&entry.author.username),
            iso_date: iso_date(entry.comment.created_at),
            published: human_date(entry.comment.created_at),
        }
    }
}

/// Label, help text and current state of one form input.
#[derive(Clone)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub help_text: &'static str,
    pub error: Option<String>,
}

impl FieldView {
    fn new(meta: FieldMeta, error: Option<String>) -> Self {
        Self {
            name: meta.name,
            label: meta.label,
            help_text: meta.help_text,
            error,
        }
    }
}

pub struct PostDetailContext {
    pub post: PostCard,
    pub author_post_count: u64,
    pub comments: Vec<CommentView>,
    pub can_comment: bool,
    pub can_edit: bool,
    pub edit_href: String,
    pub comment_action: String,
    pub comment_field: FieldView,
}

impl PostDetailContext {
    pub fn new(
        entry: &PostEntry,
        author_post_count: u64,
        comments: &[CommentEntry],
        viewer: &Viewer,
    ) -> Self {
        let id = entry.post.id;
        Self {
            post: PostCard::from_entry(entry),
            author_post_count,
            comments: comments.iter().map(CommentView::from_entry).collect(),
            can_comment: viewer.is_authenticated(),
            can_edit: viewer.is_user(entry.post.author_id),
            edit_href: format!("/posts/{id}/edit/"),
            comment_action: format!("/posts/{id}/comment/"),
            comment_field: FieldView::new(COMMENT_FIELD, None),
        }
    }
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

#[derive(Clone)]
pub struct GroupOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub struct PostFormContext {
    pub is_edit: bool,
    pub action: String,
    pub text: String,
    pub text_field: FieldView,
    pub group_field: FieldView,
    pub image_field: FieldView,
    pub groups: Vec<GroupOption>,
    pub no_group_selected: bool,
    pub current_image: Option<String>,
}

impl PostFormContext {
    /// Empty form for a new post.
    pub fn blank(groups: &[GroupRecord]) -> Self {
        Self::build(
            false,
            "/create/".to_string(),
            &PostFormData::default(),
            groups,
            None,
        )
    }

    /// Form pre-filled from an existing post.
    pub fn for_entry(entry: &PostEntry, groups: &[GroupRecord]) -> Self {
        let data = PostFormData {
            text: entry.post.text.clone(),
            group: entry.post.group_id.map(|id| id.to_string()),
            errors: PostFormErrors::default(),
        };
        Self::build(
            true,
            format!("/posts/{}/edit/", entry.post.id),
            &data,
            groups,
            entry.post.image.as_deref(),
        )
    }

    /// Submitted values redisplayed alongside their validation messages.
    pub fn rejected(
        data: &PostFormData,
        groups: &[GroupRecord],
        editing: Option<&PostEntry>,
    ) -> Self {
        match editing {
            Some(entry) => Self::build(
                true,
                format!("/posts/{}/edit/", entry.post.id),
                data,
                groups,
                entry.post.image.as_deref(),
            ),
            None => Self::build(false, "/create/".to_string(), data, groups, None),
        }
    }

    fn build(
        is_edit: bool,
        action: String,
        data: &PostFormData,
        groups: &[GroupRecord],
        current_image: Option<&str>,
    ) -> Self {
        let selected = data.group.as_deref().map(str::trim).unwrap_or_default();
        let options: Vec<GroupOption> = groups
            .iter()
            .map(|group| {
                let value = group.id.to_string();
                GroupOption {
                    selected: value == selected,
                    label: group.to_string(),
                    value,
                }
            })
            .collect();
        let no_group_selected = !options.iter().any(|option| option.selected);

        Self {
            is_edit,
            action,
            text: data.text.clone(),
            text_field: FieldView::new(TEXT_FIELD, data.errors.text.clone()),
            group_field: FieldView::new(GROUP_FIELD, data.errors.group.clone()),
            image_field: FieldView::new(IMAGE_FIELD, data.errors.image.clone()),
            groups: options,
            no_group_selected,
            current_image: current_image.map(media_href),
        }
    }
}

#[derive(Template)]
#[template(path = "create_post.html")]
pub struct PostFormTemplate {
    pub view: LayoutContext<PostFormContext>,
}

pub struct ErrorPageView {
    pub status_code: u16,
    pub title: String,
    pub message: String,
    pub action: ErrorAction,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            status_code: StatusCode::NOT_FOUND.as_u16(),
            title: "Page not found".to_string(),
            message: "The page you requested does not exist.".to_string(),
            action: ErrorAction::home(),
        }
    }

    pub fn from_status(status: StatusCode, message: &str) -> Self {
        if status == StatusCode::NOT_FOUND {
            return Self::not_found();
        }
        Self {
            status_code: status.as_u16(),
            title: status
                .canonical_reason()
                .unwrap_or("Something went wrong")
                .to_string(),
            message: message.to_string(),
            action: ErrorAction::home(),
        }
    }
}

pub struct ErrorAction {
    pub href: String,
    pub label: String,
}

impl ErrorAction {
    pub fn home() -> Self {
        Self {
            href: "/".to_string(),
            label: "Back to home".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

pub fn post_href(id: i64) -> String {
    format!("/posts/{id}/")
}

pub fn profile_href(username: &str) -> String {
    format!("/profile/{username}/")
}

pub fn group_href(slug: &str) -> String {
    format!("/group/{slug}/")
}

pub fn media_href(stored_path: &str) -> String {
    format!("/media/{stored_path}")
}

fn page_href(number: u64) -> String {
    format!("?page={number}")
}

fn iso_date(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_default()
}

fn human_date(at: OffsetDateTime) -> String {
    at.format(format_description!(
        "[day padding:none] [month repr:long] [year]"
    ))
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pagination::Paginator;
    use crate::domain::entities::{AuthorRef, GroupRef, PostRecord};
    use std::num::NonZeroU32;
    use time::macros::datetime;

    fn entry() -> PostEntry {
        PostEntry {
            post: PostRecord {
                id: 3,
                text: "Hello".to_string(),
                created_at: datetime!(2026-03-05 10:00 UTC),
                author_id: 1,
                group_id: Some(2),
                image: Some("posts/2026/03/05/abc-cat.gif".to_string()),
            },
            author: AuthorRef {
                id: 1,
                username: "leo".to_string(),
                full_name: "Leo Tolstoy".to_string(),
            },
            group: Some(GroupRef {
                id: 2,
                slug: "cats".to_string(),
                title: "Cats".to_string(),
            }),
        }
    }

    #[test]
    fn post_card_links_author_group_and_media() {
        let card = PostCard::from_entry(&entry());
        assert_eq!(card.detail_href, "/posts/3/");
        assert_eq!(card.author_href, "/profile/leo/");
        assert_eq!(card.published, "5 March 2026");
        let group = card.group.expect("group link");
        assert_eq!(group.href, "/group/cats/");
        assert_eq!(
            card.image_url.as_deref(),
            Some("/media/posts/2026/03/05/abc-cat.gif")
        );
    }

    #[test]
    fn paginator_links_only_where_pages_exist() {
        let paginator = Paginator::new(NonZeroU32::new(10).unwrap());
        let first = PaginatorView::from_window(&paginator.window(25, None));
        assert!(first.previous_href.is_none());
        assert_eq!(first.next_href.as_deref(), Some("?page=2"));
        assert_eq!(first.last_href.as_deref(), Some("?page=3"));

        let last = PaginatorView::from_window(&paginator.window(25, Some("3")));
        assert_eq!(last.previous_href.as_deref(), Some("?page=2"));
        assert!(last.next_href.is_none());

        let single = PaginatorView::from_window(&paginator.window(0, None));
        assert!(!single.is_paginated());
    }

    #[test]
    fn edit_form_preselects_current_group() {
        let groups = vec![
            GroupRecord {
                id: 1,
                title: "Dogs".to_string(),
                slug: "dogs".to_string(),
                description: String::new(),
            },
            GroupRecord {
                id: 2,
                title: "Cats".to_string(),
                slug: "cats".to_string(),
                description: String::new(),
            },
        ];
        let form = PostFormContext::for_entry(&entry(), &groups);
        assert!(form.is_edit);
        assert_eq!(form.action, "/posts/3/edit/");
        assert_eq!(form.text, "Hello");
        assert!(!form.groups[0].selected);
        assert!(form.groups[1].selected);
        assert!(!form.no_group_selected);
        assert!(form.current_image.is_some());

        let blank = PostFormContext::blank(&groups);
        assert!(!blank.is_edit);
        assert!(blank.no_group_selected);
        assert_eq!(blank.text_field.label, "Post text");
    }

    #[test]
    fn detail_context_gates_comment_and_edit() {
        let anonymous = PostDetailContext::new(&entry(), 1, &[], &Viewer::Anonymous);
        assert!(!anonymous.can_comment);
        assert!(!anonymous.can_edit);

        let author = Viewer::User(crate::domain::entities::UserRecord {
            id: 1,
            username: "leo".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            date_joined: datetime!(2026-01-01 00:00 UTC),
        });
        let own = PostDetailContext::new(&entry(), 1, &[], &author);
        assert!(own.can_comment);
        assert!(own.can_edit);
        assert_eq!(own.comment_action, "/posts/3/comment/");
    }
}
