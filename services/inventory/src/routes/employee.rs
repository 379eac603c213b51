//! Pages for any logged-in user

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use tracing::info;

use crate::{error::AppResult, middleware::Viewer, session, state::AppState, views};

pub async fn dashboard(Extension(viewer): Extension<Viewer>, jar: PrivateCookieJar) -> impl IntoResponse {
    let (jar, flashes) = session::take_flashes(jar);
    (jar, views::employee_dashboard(&viewer.user.first_name, &flashes))
}

pub async fn assigned_items(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    jar: PrivateCookieJar,
) -> AppResult<Response> {
    let user = viewer.user;
    let items = state.registry.list_assigned_to(user.id).await?;
    info!("Assigned items accessed by {}", user.email);

    let (jar, flashes) = session::take_flashes(jar);
    Ok((jar, views::assigned_items(&user, &items, &flashes)).into_response())
}

pub async fn profile(Extension(viewer): Extension<Viewer>, jar: PrivateCookieJar) -> impl IntoResponse {
    let (jar, flashes) = session::take_flashes(jar);
    (jar, views::profile(&viewer.user, &flashes))
}
