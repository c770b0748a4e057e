//! Authoring handlers: create, edit and comment. All of them require a signed-in viewer.

use axum::{
    extract::{FromRequest, Path, Request, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
};

use crate::application::{
    forms::PostFormData,
    posts::{CommentOutcome, CreateOutcome, EditAccess, EditOutcome},
};
use crate::domain::entities::PostEntry;
use crate::presentation::views::{
    LayoutChrome, LayoutContext, PostFormContext, PostFormTemplate, post_href, profile_href,
    render_error_response, render_not_found_response, render_template_response,
};

use super::{
    HttpState,
    auth::{CurrentViewer, login_redirect},
    forms::{PostSubmissionForm, read_comment},
    parse_post_id, post_error_response,
};

const CREATE_TITLE: &str = "New post";
const EDIT_TITLE: &str = "Edit post";

pub(super) async fn create_form(
    State(state): State<HttpState>,
    CurrentViewer(viewer): CurrentViewer,
    uri: Uri,
) -> Response {
    if !viewer.is_authenticated() {
        return login_redirect(&state.auth, &uri);
    }
    let chrome = LayoutChrome::for_viewer(&viewer);
    match state.posts.list_groups().await {
        Ok(groups) => render_form(chrome, PostFormContext::blank(&groups)),
        Err(err) => post_error_response(chrome, err),
    }
}

pub(super) async fn create_submit(
    State(state): State<HttpState>,
    CurrentViewer(viewer): CurrentViewer,
    request: Request,
) -> Response {
    let Some(author) = viewer.user().cloned() else {
        return login_redirect(&state.auth, request.uri());
    };
    let chrome = LayoutChrome::for_viewer(&viewer);

    let submission = match PostSubmissionForm::from_request(request, &state).await {
        Ok(PostSubmissionForm(submission)) => submission,
        Err(err) => return render_error_response(chrome, err),
    };

    match state.posts.create_post(&author, submission).await {
        Ok(CreateOutcome::Created(_)) => {
            Redirect::to(&profile_href(&author.username)).into_response()
        }
        Ok(CreateOutcome::Rejected(form)) => {
            rejected_form(&state, chrome, &form, None).await
        }
        Err(err) => post_error_response(chrome, err),
    }
}

pub(super) async fn edit_form(
    State(state): State<HttpState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(raw_id): Path<String>,
    uri: Uri,
) -> Response {
    let Some(user) = viewer.user() else {
        return login_redirect(&state.auth, &uri);
    };
    let chrome = LayoutChrome::for_viewer(&viewer);
    let Some(id) = parse_post_id(&raw_id) else {
        return render_not_found_response(chrome);
    };

    let entry = match state.posts.edit_access(user, id).await {
        Ok(EditAccess::Granted(entry)) => entry,
        Ok(EditAccess::Denied) => return Redirect::to(&post_href(id)).into_response(),
        Err(err) => return post_error_response(chrome, err),
    };

    match state.posts.list_groups().await {
        Ok(groups) => render_form(chrome, PostFormContext::for_entry(&entry, &groups)),
        Err(err) => post_error_response(chrome, err),
    }
}

pub(super) async fn edit_submit(
    State(state): State<HttpState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(raw_id): Path<String>,
    request: Request,
) -> Response {
    let Some(user) = viewer.user().cloned() else {
        return login_redirect(&state.auth, request.uri());
    };
    let chrome = LayoutChrome::for_viewer(&viewer);
    let Some(id) = parse_post_id(&raw_id) else {
        return render_not_found_response(chrome);
    };

    // Non-authors are turned away before their body is read.
    match state.posts.edit_access(&user, id).await {
        Ok(EditAccess::Granted(_)) => {}
        Ok(EditAccess::Denied) => return Redirect::to(&post_href(id)).into_response(),
        Err(err) => return post_error_response(chrome, err),
    }

    let submission = match PostSubmissionForm::from_request(request, &state).await {
        Ok(PostSubmissionForm(submission)) => submission,
        Err(err) => return render_error_response(chrome, err),
    };

    match state.posts.update_post(&user, id, submission).await {
        Ok(EditOutcome::Updated(_) | EditOutcome::Denied) => {
            Redirect::to(&post_href(id)).into_response()
        }
        Ok(EditOutcome::Rejected { entry, form }) => {
            rejected_form(&state, chrome, &form, Some(&entry)).await
        }
        Err(err) => post_error_response(chrome, err),
    }
}

pub(super) async fn add_comment(
    State(state): State<HttpState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(raw_id): Path<String>,
    request: Request,
) -> Response {
    let Some(user) = viewer.user().cloned() else {
        return login_redirect(&state.auth, request.uri());
    };
    let chrome = LayoutChrome::for_viewer(&viewer);
    let Some(id) = parse_post_id(&raw_id) else {
        return render_not_found_response(chrome);
    };

    let payload = read_comment(request, &state).await;
    match state.posts.add_comment(&user, id, &payload.text).await {
        Ok(CommentOutcome::Created(_) | CommentOutcome::Dropped { .. }) => {
            Redirect::to(&post_href(id)).into_response()
        }
        Err(err) => post_error_response(chrome, err),
    }
}

/// Redisplay a rejected submission; validation failures answer 200 with the form.
async fn rejected_form(
    state: &HttpState,
    chrome: LayoutChrome,
    form: &PostFormData,
    editing: Option<&PostEntry>,
) -> Response {
    match state.posts.list_groups().await {
        Ok(groups) => render_form(chrome, PostFormContext::rejected(form, &groups, editing)),
        Err(err) => post_error_response(chrome, err),
    }
}

fn render_form(chrome: LayoutChrome, content: PostFormContext) -> Response {
    let title = if content.is_edit { EDIT_TITLE } else { CREATE_TITLE };
    let view = LayoutContext::new(chrome.titled(title), content);
    render_template_response(PostFormTemplate { view }, StatusCode::OK)
}
