use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
    },
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use serde::Deserialize;

use crate::application::{
    auth::SessionService,
    error::HttpError,
    media::{MediaError, MediaStore},
    posts::PostService,
    repos::HealthRepo,
};
use crate::presentation::views::{
    FeedContext, GroupContext, GroupTemplate, IndexTemplate, LayoutChrome, LayoutContext,
    PaginatorView, PostDetailContext, PostDetailTemplate, ProfileContext, ProfileTemplate,
    build_post_cards, render_not_found_response, render_template_response,
};

use super::{
    auth::{AuthConfig, CurrentViewer, resolve_viewer},
    db_health_response,
    middleware::{log_responses, set_request_context},
    parse_post_id, post_error_response, posts,
};

const INDEX_HEADING: &str = "Latest updates";

#[derive(Clone)]
pub struct HttpState {
    pub posts: Arc<PostService>,
    pub sessions: Arc<SessionService>,
    pub media: Arc<dyn MediaStore>,
    pub health: Arc<dyn HealthRepo>,
    pub auth: Arc<AuthConfig>,
    pub max_request_bytes: usize,
}

pub fn build_router(state: HttpState) -> Router {
    let body_limit = state.max_request_bytes;

    Router::new()
        .route("/", get(index))
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route("/posts/{id}/", get(post_detail))
        .route(
            "/create/",
            get(posts::create_form).post(posts::create_submit),
        )
        .route(
            "/posts/{id}/edit/",
            get(posts::edit_form).post(posts::edit_submit),
        )
        .route("/posts/{id}/comment/", post(posts::add_comment))
        .route("/media/{*path}", get(serve_media))
        .route("/_health/db", get(db_health))
        .fallback(fallback)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn_with_state(state.clone(), resolve_viewer))
        .layer(middleware::from_fn(set_request_context))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
}

async fn index(
    State(state): State<HttpState>,
    CurrentViewer(viewer): CurrentViewer,
    Query(query): Query<PageQuery>,
) -> Response {
    let chrome = LayoutChrome::for_viewer(&viewer);
    match state.posts.index(query.page.as_deref()).await {
        Ok(page) => {
            let content = FeedContext {
                heading: INDEX_HEADING.to_string(),
                posts: build_post_cards(&page),
                paginator: PaginatorView::from_window(&page.window),
            };
            let view = LayoutContext::new(chrome.titled(INDEX_HEADING), content);
            render_template_response(IndexTemplate { view }, StatusCode::OK)
        }
        Err(err) => post_error_response(chrome, err),
    }
}

async fn group_posts(
    State(state): State<HttpState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let chrome = LayoutChrome::for_viewer(&viewer);
    match state.posts.group_feed(&slug, query.page.as_deref()).await {
        Ok(feed) => {
            let title = format!("Posts of group {}", feed.group.title);
            let content = GroupContext {
                title: feed.group.title.clone(),
                description: feed.group.description.clone(),
                posts: build_post_cards(&feed.page),
                paginator: PaginatorView::from_window(&feed.page.window),
            };
            let view = LayoutContext::new(chrome.titled(&title), content);
            render_template_response(GroupTemplate { view }, StatusCode::OK)
        }
        Err(err) => post_error_response(chrome, err),
    }
}

async fn profile(
    State(state): State<HttpState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let chrome = LayoutChrome::for_viewer(&viewer);
    match state.posts.profile(&username, query.page.as_deref()).await {
        Ok(feed) => {
            let display_name = feed.author.display_name();
            let title = format!("Profile of {display_name}");
            let content = ProfileContext {
                username: feed.author.username.clone(),
                display_name,
                post_count: feed.post_count,
                posts: build_post_cards(&feed.page),
                paginator: PaginatorView::from_window(&feed.page.window),
            };
            let view = LayoutContext::new(chrome.titled(&title), content);
            render_template_response(ProfileTemplate { view }, StatusCode::OK)
        }
        Err(err) => post_error_response(chrome, err),
    }
}

async fn post_detail(
    State(state): State<HttpState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(raw_id): Path<String>,
) -> Response {
    let chrome = LayoutChrome::for_viewer(&viewer);
    let Some(id) = parse_post_id(&raw_id) else {
        return render_not_found_response(chrome);
    };

    match state.posts.post_detail(id).await {
        Ok(detail) => {
            let title = format!("Post {}", detail.entry.post);
            let content = PostDetailContext::new(
                &detail.entry,
                detail.author_post_count,
                &detail.comments,
                &viewer,
            );
            let view = LayoutContext::new(chrome.titled(&title), content);
            render_template_response(PostDetailTemplate { view }, StatusCode::OK)
        }
        Err(err) => post_error_response(chrome, err),
    }
}

async fn serve_media(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    const SOURCE: &str = "infra::http::public::serve_media";
    match state.media.read(&path).await {
        Ok(bytes) => build_media_response(&path, bytes),
        Err(MediaError::InvalidPath(_) | MediaError::NotFound(_)) => HttpError::new(
            SOURCE,
            StatusCode::NOT_FOUND,
            "Media not found",
            format!("media `{path}` does not exist"),
        )
        .into_response(),
        Err(err) => HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to read media",
            &err,
        )
        .into_response(),
    }
}

fn build_media_response(path: &str, bytes: Bytes) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    // Stored names embed a random id, so content under a path never changes.
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}

async fn db_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.health_check().await)
}

async fn fallback(CurrentViewer(viewer): CurrentViewer) -> Response {
    render_not_found_response(LayoutChrome::for_viewer(&viewer))
}
