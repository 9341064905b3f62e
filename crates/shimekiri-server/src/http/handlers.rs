// SPDX-License-Identifier: Apache-2.0

use crate::http::pages;
use crate::AppState;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;
use shimekiri_model::{evaluate_deadline, TodoId, TodoStatus, User};
use shimekiri_store::{StoreError, TodoFilter};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn};

pub(crate) fn make_request_id(state: &AppState) -> String {
    let id = state.request_id_seed.fetch_add(1, Ordering::Relaxed);
    format!("req-{id:016x}")
}

pub(crate) fn propagated_request_id(headers: &HeaderMap, state: &AppState) -> String {
    if let Some(raw) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    make_request_id(state)
}

pub(crate) fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(v) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert("x-request-id", v);
    }
    response
}

fn html_response(html: String) -> Response {
    let mut resp = Response::new(Body::from(html));
    resp.headers_mut().insert(
        "content-type",
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    resp
}

fn plain_response(status: StatusCode, message: &str) -> Response {
    (status, message.to_string()).into_response()
}

fn redirect_found(location: &str) -> Response {
    let mut resp = Response::new(Body::empty());
    *resp.status_mut() = StatusCode::FOUND;
    if let Ok(v) = HeaderValue::from_str(location) {
        resp.headers_mut().insert("location", v);
    }
    resp
}

fn store_error_response(err: StoreError) -> Response {
    match err {
        StoreError::NotFound => plain_response(StatusCode::NOT_FOUND, "not found"),
        StoreError::NotOwner => plain_response(StatusCode::FORBIDDEN, "forbidden"),
        StoreError::Validation(e) => plain_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            &format!("validation failed: {e}"),
        ),
        StoreError::Storage(msg) => {
            error!("storage failure: {msg}");
            plain_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
        _ => plain_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error"),
    }
}

fn bool_query_flag(params: &HashMap<String, String>, name: &str) -> bool {
    params
        .get(name)
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn cookie_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let raw = headers.get("cookie")?.to_str().ok()?;
    for piece in raw.split(';') {
        let Some((name, value)) = piece.trim().split_once('=') else {
            continue;
        };
        if name == cookie_name && !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

fn session_cookie(name: &str, token: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax")).ok()
}

fn expired_cookie(name: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{name}=; Path=/; HttpOnly; Max-Age=0")).ok()
}

async fn current_user(state: &AppState, headers: &HeaderMap) -> Option<User> {
    let token = cookie_token(headers, &state.config.session_cookie)?;
    let user_id = state.sessions.resolve(&token).await?;
    match state.store.lock().await.user_by_id(user_id) {
        Ok(user) => user,
        Err(e) => {
            error!("session user lookup failed: {e}");
            None
        }
    }
}

pub(crate) async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub(crate) async fn version_handler() -> impl IntoResponse {
    let mut resp = Json(json!({
        "name": crate::CRATE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response();
    if let Ok(v) = HeaderValue::from_str("public, max-age=30") {
        resp.headers_mut().insert("cache-control", v);
    }
    resp
}

pub(crate) async fn home_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let user = current_user(&state, &headers).await;
    let near_due = match &user {
        Some(user) => {
            let today = state.clock.today();
            match state.store.lock().await.count_near_due(user.id, today) {
                Ok(count) => count,
                Err(e) => return with_request_id(store_error_response(e), &request_id),
            }
        }
        None => 0,
    };
    with_request_id(
        html_response(pages::home_page(user.as_ref(), near_due)),
        &request_id,
    )
}

pub(crate) async fn auth_callback_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let identity = match state.provider.fetch_identity().await {
        Ok(identity) => identity,
        Err(e) => {
            warn!(request_id = %request_id, "identity provider failed: {e}");
            return with_request_id(
                plain_response(StatusCode::SERVICE_UNAVAILABLE, "login provider unavailable"),
                &request_id,
            );
        }
    };
    let user = match state.store.lock().await.find_or_create_user(&identity) {
        Ok(user) => user,
        Err(e) => return with_request_id(store_error_response(e), &request_id),
    };
    let token = state.sessions.open_session(user.id).await;
    info!(request_id = %request_id, nickname = %user.nickname.as_str(), "login");
    let mut resp = redirect_found("/");
    if let Some(cookie) = session_cookie(&state.config.session_cookie, &token) {
        resp.headers_mut().insert("set-cookie", cookie);
    }
    with_request_id(resp, &request_id)
}

pub(crate) async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    if let Some(token) = cookie_token(&headers, &state.config.session_cookie) {
        state.sessions.close_session(&token).await;
    }
    let mut resp = redirect_found("/");
    if let Some(cookie) = expired_cookie(&state.config.session_cookie) {
        resp.headers_mut().insert("set-cookie", cookie);
    }
    with_request_id(resp, &request_id)
}

pub(crate) async fn profile_handler(
    State(state): State<AppState>,
    Path(nickname): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let incomplete_only = bool_query_flag(&params, "incomplete");
    let store = state.store.lock().await;
    let owner = match store.user_by_nickname(&nickname) {
        Ok(Some(owner)) => owner,
        Ok(None) => {
            return with_request_id(
                plain_response(StatusCode::NOT_FOUND, "unknown user"),
                &request_id,
            )
        }
        Err(e) => return with_request_id(store_error_response(e), &request_id),
    };
    let todos = match store.todos_for_user(owner.id, TodoFilter { incomplete_only }) {
        Ok(todos) => todos,
        Err(e) => return with_request_id(store_error_response(e), &request_id),
    };
    drop(store);
    with_request_id(
        html_response(pages::profile_page(&owner, &todos, incomplete_only)),
        &request_id,
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateTodoForm {
    content: String,
    due_date: String,
}

pub(crate) async fn create_todo_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<CreateTodoForm>,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let Some(caller) = current_user(&state, &headers).await else {
        return with_request_id(
            plain_response(StatusCode::UNAUTHORIZED, "login required"),
            &request_id,
        );
    };
    let created = state
        .store
        .lock()
        .await
        .create_todo(caller.id, &form.content, &form.due_date);
    match created {
        Ok(todo) => {
            info!(
                request_id = %request_id,
                todo_id = todo.id.as_i64(),
                nickname = %caller.nickname.as_str(),
                "todo created"
            );
            with_request_id(
                redirect_found(&format!("/users/{}", caller.nickname.as_str())),
                &request_id,
            )
        }
        Err(e) => with_request_id(store_error_response(e), &request_id),
    }
}

pub(crate) async fn show_todo_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let todo = match state.store.lock().await.todo_by_id(TodoId::new(id)) {
        Ok(Some(todo)) => todo,
        Ok(None) => {
            return with_request_id(
                plain_response(StatusCode::NOT_FOUND, "unknown todo"),
                &request_id,
            )
        }
        Err(e) => return with_request_id(store_error_response(e), &request_id),
    };
    let due_status = evaluate_deadline(&todo.due_date, state.clock.today());
    with_request_id(
        html_response(pages::todo_page(&todo, due_status)),
        &request_id,
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateStatusForm {
    status: String,
}

pub(crate) async fn update_todo_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Form(form): Form<UpdateStatusForm>,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let Some(caller) = current_user(&state, &headers).await else {
        return with_request_id(
            plain_response(StatusCode::UNAUTHORIZED, "login required"),
            &request_id,
        );
    };
    let status = match TodoStatus::parse(&form.status) {
        Ok(status) => status,
        Err(e) => {
            return with_request_id(
                plain_response(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    &format!("validation failed: {e}"),
                ),
                &request_id,
            )
        }
    };
    let updated = state
        .store
        .lock()
        .await
        .update_status(caller.id, TodoId::new(id), status);
    match updated {
        Ok(todo) => {
            info!(
                request_id = %request_id,
                todo_id = todo.id.as_i64(),
                status = %todo.status.as_i64(),
                "todo status updated"
            );
            with_request_id(redirect_found(&format!("/todos/{id}")), &request_id)
        }
        Err(e) => with_request_id(store_error_response(e), &request_id),
    }
}

pub(crate) async fn delete_todo_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let Some(caller) = current_user(&state, &headers).await else {
        return with_request_id(
            plain_response(StatusCode::UNAUTHORIZED, "login required"),
            &request_id,
        );
    };
    match state
        .store
        .lock()
        .await
        .delete_todo(caller.id, TodoId::new(id))
    {
        Ok(()) => {
            info!(request_id = %request_id, todo_id = id, "todo deleted");
            with_request_id(
                redirect_found(&format!("/users/{}", caller.nickname.as_str())),
                &request_id,
            )
        }
        Err(e) => with_request_id(store_error_response(e), &request_id),
    }
}

pub(crate) async fn delete_completed_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let Some(caller) = current_user(&state, &headers).await else {
        return with_request_id(
            plain_response(StatusCode::UNAUTHORIZED, "login required"),
            &request_id,
        );
    };
    match state.store.lock().await.delete_completed(caller.id) {
        Ok(deleted) => {
            info!(request_id = %request_id, deleted, "completed todos cleared");
            with_request_id(
                redirect_found(&format!("/users/{}", caller.nickname.as_str())),
                &request_id,
            )
        }
        Err(e) => with_request_id(store_error_response(e), &request_id),
    }
}

pub(crate) async fn ogp_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let todo = match state.store.lock().await.todo_by_id(TodoId::new(id)) {
        Ok(Some(todo)) => todo,
        Ok(None) => {
            return with_request_id(
                plain_response(StatusCode::NOT_FOUND, "unknown todo"),
                &request_id,
            )
        }
        Err(e) => return with_request_id(store_error_response(e), &request_id),
    };
    let due_status = evaluate_deadline(&todo.due_date, state.clock.today());
    match state.preview.render(&todo, due_status) {
        Ok(bytes) => {
            let mut resp = Response::new(Body::from(bytes));
            resp.headers_mut()
                .insert("content-type", HeaderValue::from_static("image/png"));
            with_request_id(resp, &request_id)
        }
        Err(e) => {
            error!(request_id = %request_id, todo_id = id, "preview render failed: {e}");
            with_request_id(
                plain_response(StatusCode::INTERNAL_SERVER_ERROR, "preview unavailable"),
                &request_id,
            )
        }
    }
}
