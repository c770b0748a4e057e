mod auth;
mod forms;
mod middleware;
mod posts;
mod public;

pub use auth::{AuthConfig, CurrentViewer, resolve_viewer};
pub use middleware::RequestContext;
pub use public::{HttpState, build_router};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::error::{AppError, HttpError};
use crate::application::posts::PostError;
use crate::application::repos::RepoError;
use crate::presentation::views::{LayoutChrome, render_error_response};

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => AppError::Repo(err).into_response(),
    }
}

/// Render the public error page matching a service failure.
fn post_error_response(chrome: LayoutChrome, err: PostError) -> Response {
    render_error_response(chrome, HttpError::from(err))
}

/// Post ids in paths are unsigned decimal integers; anything else is treated as unknown.
fn parse_post_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
