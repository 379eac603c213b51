//! Inventory service routes

mod admin;
mod auth;
mod employee;
mod items;

use axum::{
    Json, Router,
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    error::{AppError, AppResult},
    middleware::{require_admin, require_login},
    services::ErrorKind,
    session::{self, FlashLevel},
    state::AppState,
};

pub(crate) const LOGIN: &str = "/login";
pub(crate) const ALL_USERS: &str = "/admin_dashboard/all_users";
pub(crate) const ALL_ITEMS: &str = "/admin_dashboard/all_items";

/// Create the router for the inventory service
pub fn create_router(state: AppState) -> Router {
    let employee_routes = Router::new()
        .route("/employee_dashboard", get(employee::dashboard))
        .route("/assigned_item", get(employee::assigned_items))
        .route("/profile", get(employee::profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

    let admin_routes = Router::new()
        .route("/admin_dashboard", get(admin::dashboard))
        .route("/admin_dashboard/admin_profile", get(admin::profile))
        .route("/admin_dashboard/all_users", get(admin::all_users))
        .route("/add_user", post(admin::add_user))
        .route("/delete_user", delete(admin::delete_user))
        .route("/admin_dashboard/all_items", get(items::all_items))
        .route("/admin_dashboard/add_item", post(items::add_item))
        .route("/admin_dashboard/assign_item", post(items::assign_item))
        .route(
            "/admin_dashboard/unassign_item/:item_id",
            get(items::unassign_item).post(items::unassign_item),
        )
        .route("/delete_item", delete(items::delete_item))
        .route("/edit_item", post(items::edit_item))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/", get(auth::home))
        .route("/health", get(health_check))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .merge(employee_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "inventory-service"
    }))
}

/// `302 Found` to `location`
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub(crate) fn redirect_with_flash(
    jar: PrivateCookieJar,
    level: FlashLevel,
    message: impl Into<String>,
    location: &str,
) -> Response {
    (session::flash(jar, level, message), found(location)).into_response()
}

/// Flash the message of a rejected request. Internal failures are returned
/// so that they surface as an error page.
pub(crate) fn flash_rejection(
    jar: PrivateCookieJar,
    error: impl Into<AppError>,
) -> AppResult<PrivateCookieJar> {
    let error = error.into();
    if error.kind() == ErrorKind::Internal {
        return Err(error);
    }
    Ok(session::flash(jar, FlashLevel::Error, error.to_string()))
}

/// Parse a record id submitted as a form field
pub(crate) fn parse_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|raw| raw.trim().parse().ok())
}

/// Body of the JSON delete endpoints; the id may arrive as a number or a string
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    id: Option<RecordId>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordId {
    Number(i64),
    Text(String),
}

impl DeleteRequest {
    pub(crate) fn id(&self) -> Option<i64> {
        match &self.id {
            Some(RecordId::Number(id)) => Some(*id),
            Some(RecordId::Text(raw)) => parse_id(Some(raw)),
            None => None,
        }
    }
}
