//! Session and flash storage in encrypted cookies

use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::Session;

pub const SESSION_COOKIE: &str = "session";
pub const FLASH_COOKIE: &str = "flash";

fn cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Read the session; a missing or unreadable cookie is an empty session
pub fn load(jar: &PrivateCookieJar) -> Session {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Session::default();
    };

    serde_json::from_str(cookie.value()).unwrap_or_else(|e| {
        warn!("Discarding unreadable session cookie: {}", e);
        Session::default()
    })
}

pub fn store(jar: PrivateCookieJar, session: &Session) -> PrivateCookieJar {
    match serde_json::to_string(session) {
        Ok(value) => jar.add(cookie(SESSION_COOKIE, value)),
        Err(e) => {
            warn!("Failed to serialize session: {}", e);
            jar
        }
    }
}

pub fn clear(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(removal(SESSION_COOKIE))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// One-shot message shown on the next rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

fn pending_flashes(jar: &PrivateCookieJar) -> Vec<Flash> {
    jar.get(FLASH_COOKIE)
        .and_then(|cookie| serde_json::from_str(cookie.value()).ok())
        .unwrap_or_default()
}

/// Queue a message for the next rendered page
pub fn flash(jar: PrivateCookieJar, level: FlashLevel, message: impl Into<String>) -> PrivateCookieJar {
    let mut messages = pending_flashes(&jar);
    messages.push(Flash {
        level,
        message: message.into(),
    });

    match serde_json::to_string(&messages) {
        Ok(value) => jar.add(cookie(FLASH_COOKIE, value)),
        Err(e) => {
            warn!("Failed to serialize flash messages: {}", e);
            jar
        }
    }
}

/// Drain the queued messages
pub fn take_flashes(jar: PrivateCookieJar) -> (PrivateCookieJar, Vec<Flash>) {
    let messages = pending_flashes(&jar);
    if messages.is_empty() {
        return (jar, messages);
    }
    (jar.remove(removal(FLASH_COOKIE)), messages)
}
