//! Request-scoped viewer resolution from the session cookie.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{HeaderMap, Request, Uri, header::COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, warn};

use crate::application::auth::{SessionAuthError, Viewer, login_redirect_url};

use super::HttpState;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub login_url: String,
    pub session_cookie: String,
}

/// The viewer inserted by [`resolve_viewer`]; anonymous when the middleware did not run.
#[derive(Debug, Clone)]
pub struct CurrentViewer(pub Viewer);

impl<S> FromRequestParts<S> for CurrentViewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts.extensions.get::<Viewer>().cloned().unwrap_or_default(),
        ))
    }
}

pub async fn resolve_viewer(
    State(state): State<HttpState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let viewer = match session_token(request.headers(), &state.auth.session_cookie) {
        Some(token) => match state.sessions.authenticate(&token).await {
            Ok(user) => Viewer::User(user),
            Err(SessionAuthError::Repo(err)) => {
                warn!(
                    target = "scribe::http::auth",
                    error = %err,
                    "session lookup failed; continuing anonymously"
                );
                Viewer::Anonymous
            }
            Err(err) => {
                debug!(target = "scribe::http::auth", reason = %err, "session rejected");
                Viewer::Anonymous
            }
        },
        None => Viewer::Anonymous,
    };

    request.extensions_mut().insert(viewer);
    next.run(request).await
}

/// Send an anonymous visitor to the login entry point, remembering where they were going.
pub(super) fn login_redirect(config: &AuthConfig, uri: &Uri) -> Response {
    let next = uri
        .path_and_query()
        .map(|value| value.as_str())
        .unwrap_or("/");
    Redirect::to(&login_redirect_url(&config.login_url, next)).into_response()
}

fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim() == cookie_name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
