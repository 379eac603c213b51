//! Public pages: landing, registration, login and logout

use axum::{
    extract::{Form, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use tracing::info;

use super::{LOGIN, found, redirect_with_flash};
use crate::{
    error::AppResult,
    models::{Role, Session, UserCandidate},
    services::ErrorKind,
    session::{self, FlashLevel},
    state::AppState,
    views,
};

/// Self-registration form
#[derive(Default, Deserialize)]
pub struct RegisterForm {
    #[serde(rename = "first-name")]
    first_name: Option<String>,
    #[serde(rename = "last-name")]
    last_name: Option<String>,
    dob: Option<String>,
    phone: Option<String>,
    role: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

impl std::fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl From<RegisterForm> for UserCandidate {
    fn from(form: RegisterForm) -> Self {
        UserCandidate {
            first_name: form.first_name,
            last_name: form.last_name,
            dob: form.dob,
            phone_no: form.phone,
            email: form.email,
            role: form.role,
            password: form.password,
        }
    }
}

#[derive(Default, Deserialize)]
pub struct LoginForm {
    email: Option<String>,
    password: Option<String>,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub async fn home(jar: PrivateCookieJar) -> impl IntoResponse {
    let (jar, flashes) = session::take_flashes(jar);
    (jar, views::home(&flashes))
}

pub async fn register_page(jar: PrivateCookieJar) -> impl IntoResponse {
    let (jar, flashes) = session::take_flashes(jar);
    (jar, views::register(None, &flashes))
}

pub async fn register(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    match state.directory.register(form.into()).await {
        Ok(_) => Ok(redirect_with_flash(
            jar,
            FlashLevel::Success,
            "Registration successful",
            LOGIN,
        )),
        Err(e) if e.kind() != ErrorKind::Internal => {
            let (jar, flashes) = session::take_flashes(jar);
            Ok((jar, views::register(Some(&e.to_string()), &flashes)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn login_page(jar: PrivateCookieJar) -> impl IntoResponse {
    let (jar, flashes) = session::take_flashes(jar);
    (jar, views::login(None, &flashes))
}

pub async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let email = form.email.unwrap_or_default();
    let password = form.password.unwrap_or_default();

    let user = match state.directory.authenticate(&email, &password).await {
        Ok(user) => user,
        Err(e) if e.kind() != ErrorKind::Internal => {
            let (jar, flashes) = session::take_flashes(jar);
            return Ok((jar, views::login(Some(&e.to_string()), &flashes)).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let jar = session::store(jar, &Session::for_user(&user));
    let (target, message) = match user.role {
        Role::Admin => ("/admin_dashboard", "Admin logged in successfully"),
        Role::User => ("/employee_dashboard", "Employee logged in successfully"),
    };
    info!("{} logged in as {}", user.email, user.role);

    Ok(redirect_with_flash(
        jar,
        FlashLevel::Success,
        message,
        &format!("{target}?user_id={}", user.id),
    ))
}

pub async fn logout(jar: PrivateCookieJar) -> impl IntoResponse {
    let session = session::load(&jar);
    if let Some(email) = &session.email {
        info!("User logged out: {}", email);
    }

    let jar = session::clear(jar);
    let jar = session::flash(jar, FlashLevel::Success, "You have been logged out.");
    (jar, found(LOGIN))
}
