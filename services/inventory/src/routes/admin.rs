//! Administrator pages and employee management

use axum::{
    Extension, Json,
    extract::{Form, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::{info, warn};

use super::{ALL_USERS, DeleteRequest, flash_rejection, found, redirect_with_flash};
use crate::{
    error::AppResult,
    middleware::Viewer,
    models::{Item, UserCandidate, UserId},
    services::DirectoryError,
    session::{self, FlashLevel},
    state::AppState,
    views,
};

/// Account form on the roster page
#[derive(Default, Deserialize)]
pub struct AddUserForm {
    first_name: Option<String>,
    last_name: Option<String>,
    dob: Option<String>,
    phone_no: Option<String>,
    email: Option<String>,
    password: Option<String>,
    role: Option<String>,
}

impl std::fmt::Debug for AddUserForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddUserForm")
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl From<AddUserForm> for UserCandidate {
    fn from(form: AddUserForm) -> Self {
        UserCandidate {
            first_name: form.first_name,
            last_name: form.last_name,
            dob: form.dob,
            phone_no: form.phone_no,
            email: form.email,
            role: form.role,
            password: form.password,
        }
    }
}

pub async fn dashboard(Extension(viewer): Extension<Viewer>, jar: PrivateCookieJar) -> impl IntoResponse {
    let (jar, flashes) = session::take_flashes(jar);
    (jar, views::admin_dashboard(&viewer.user.first_name, &flashes))
}

pub async fn profile(Extension(viewer): Extension<Viewer>, jar: PrivateCookieJar) -> impl IntoResponse {
    let (jar, flashes) = session::take_flashes(jar);
    (jar, views::admin_profile(&viewer.user, &flashes))
}

/// Every user together with the items they hold
pub async fn all_users(State(state): State<AppState>, jar: PrivateCookieJar) -> AppResult<Response> {
    let users = state.directory.list().await?;

    let mut held: HashMap<UserId, Vec<Item>> = HashMap::new();
    for item in state.registry.list_all().await? {
        if let Some(holder) = item.assigned_to {
            held.entry(holder).or_default().push(item);
        }
    }

    let roster: Vec<_> = users
        .into_iter()
        .map(|user| {
            let items = held.remove(&user.id).unwrap_or_default();
            (user, items)
        })
        .collect();
    info!("All users accessed");

    let (jar, flashes) = session::take_flashes(jar);
    Ok((jar, views::all_users(&roster, &flashes)).into_response())
}

pub async fn add_user(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<AddUserForm>,
) -> AppResult<Response> {
    match state.directory.administrator_add(form.into()).await {
        Ok(_) => Ok(redirect_with_flash(
            jar,
            FlashLevel::Success,
            "Employee added successfully",
            ALL_USERS,
        )),
        Err(e) => {
            let jar = flash_rejection(jar, e)?;
            Ok((jar, found(ALL_USERS)).into_response())
        }
    }
}

pub async fn delete_user(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> AppResult<Response> {
    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": "User not found" })),
        )
            .into_response()
    };

    let Some(id) = request.id() else {
        warn!("Delete user failed: missing or malformed id");
        return Ok(not_found());
    };

    match state.directory.delete(UserId(id)).await {
        Ok(()) => Ok(Json(json!({ "success": true })).into_response()),
        Err(DirectoryError::NotFound(_)) => Ok(not_found()),
        Err(e) => Err(e.into()),
    }
}
