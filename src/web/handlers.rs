use axum::{
    extract::{Form, State},
    http::{HeaderMap, header::SET_COOKIE},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::travel::TripRequest;

use super::AppState;
use super::errors::ApiError;
use super::page::{Flash, PageView, render_page};
use super::session::{Theme, expired_session_cookie, session_cookie, session_id_from_headers};

#[derive(Debug, Deserialize)]
pub struct ThemeForm {
    pub theme: Theme,
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let id = state.sessions.ensure(session_id_from_headers(&headers));
    render_session(&state, id, None, None)
}

pub async fn plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(request): Form<TripRequest>,
) -> Result<Response, ApiError> {
    let id = state.sessions.ensure(session_id_from_headers(&headers));
    state.sessions.remember_request(id, request.clone());

    let output = state.planner.plan(request.clone()).await.map_err(|e| {
        tracing::error!(session = %id, "Planning failed: {e}");
        ApiError::from(e)
    })?;

    state.sessions.record_plan(id, request, output.clone());
    Ok(render_session(
        &state,
        id,
        Some(Flash::success("Travel plan created successfully!")),
        Some(&output),
    ))
}

pub async fn clear_history(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let id = state.sessions.ensure(session_id_from_headers(&headers));
    state.sessions.clear_history(id);
    render_session(&state, id, Some(Flash::success("Chat history cleared.")), None)
}

pub async fn kill_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(id) = session_id_from_headers(&headers)
        && state.sessions.kill(id)
    {
        tracing::info!(session = %id, "Session terminated");
    }

    let body = render_page(&PageView {
        flash: Some(Flash::success("Session terminated.")),
        stopped: true,
        ..Default::default()
    });
    ([(SET_COOKIE, expired_session_cookie())], Html(body)).into_response()
}

pub async fn set_theme(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ThemeForm>,
) -> Response {
    let id = state.sessions.ensure(session_id_from_headers(&headers));
    state.sessions.set_theme(id, form.theme);
    ([(SET_COOKIE, session_cookie(id))], Redirect::to("/")).into_response()
}

/// Render the full page for session `id`, refreshing its cookie.
fn render_session(
    state: &AppState,
    id: Uuid,
    flash: Option<Flash>,
    result: Option<&crate::orchestration::CrewOutput>,
) -> Response {
    let session = state.sessions.snapshot(id);
    let body = match &session {
        Some(s) => render_page(&PageView {
            theme: s.theme,
            request: s.last_request.as_ref(),
            history: &s.history,
            flash,
            result,
            stopped: false,
        }),
        None => render_page(&PageView {
            flash,
            result,
            ..Default::default()
        }),
    };
    ([(SET_COOKIE, session_cookie(id))], Html(body)).into_response()
}
