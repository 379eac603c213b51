//! Middleware deciding access to protected pages

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use tracing::warn;

use crate::{
    error::AppError,
    guard::{AccessLevel, access_level},
    models::{Session, User},
    routes::{LOGIN, found},
    services::DirectoryError,
    session::{self, FlashLevel},
    state::AppState,
};

/// The requester of a protected page, as seen by the guard
#[derive(Debug, Clone)]
pub struct Viewer {
    pub level: AccessLevel,
    pub session: Session,
    pub user: User,
}

fn deny(jar: PrivateCookieJar, message: &str) -> Response {
    let jar = session::flash(jar, FlashLevel::Error, message);
    (jar, found(LOGIN)).into_response()
}

/// Resolve the session cookie against the stored account.
///
/// The level is derived from the account as it is now, not from the role
/// recorded at login. A session whose account is gone is cleared.
async fn resolve(
    state: &AppState,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Option<Viewer>), AppError> {
    let cookie = session::load(&jar);
    let Some(user_id) = access_level(&cookie).user_id() else {
        return Ok((jar, None));
    };

    match state.directory.find(user_id).await {
        Ok(user) => {
            let session = Session::for_user(&user);
            let level = access_level(&session);
            Ok((jar, Some(Viewer { level, session, user })))
        }
        Err(DirectoryError::NotFound(_)) => {
            warn!("Session refers to deleted user {}, clearing it", user_id);
            Ok((session::clear(jar), None))
        }
        Err(e) => Err(e.into()),
    }
}

/// Require any logged-in user
pub async fn require_login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let (jar, viewer) = match resolve(&state, jar).await {
        Ok(resolved) => resolved,
        Err(e) => return e.into_response(),
    };

    let Some(viewer) = viewer else {
        warn!("Unauthorized access attempt to {}", req.uri().path());
        return deny(jar, "You are not logged in");
    };

    req.extensions_mut().insert(viewer);
    next.run(req).await
}

/// Require an administrator
pub async fn require_admin(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let (jar, viewer) = match resolve(&state, jar).await {
        Ok(resolved) => resolved,
        Err(e) => return e.into_response(),
    };

    match viewer {
        Some(viewer) if viewer.level.is_admin() => {
            req.extensions_mut().insert(viewer);
            next.run(req).await
        }
        Some(viewer) => {
            warn!("User {} is not admin: {}", viewer.user.id, req.uri().path());
            deny(jar, "You are not admin")
        }
        None => {
            warn!("Unauthorized access attempt to {}", req.uri().path());
            deny(jar, "You are not logged in")
        }
    }
}
