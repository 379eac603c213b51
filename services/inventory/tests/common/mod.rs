//! In-process HTTP client for the inventory router

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header},
};
use axum_extra::extract::cookie::{Key, PrivateCookieJar};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::util::ServiceExt;

use inventory::{
    AppState,
    clock::FixedClock,
    create_router,
    credentials::EmailPolicy,
    models::{Session, UserCandidate, UserId},
    session,
};

pub const DOMAIN: &str = "corp.com";
pub const ADMIN_EMAIL: &str = "admin@corp.com";
pub const ADMIN_PASSWORD: &str = "adminpassword";

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

/// Drives the router with `oneshot` and keeps cookies between requests
pub struct TestClient {
    pub state: AppState,
    app: Router,
    key: Key,
    cookies: BTreeMap<String, String>,
}

impl TestClient {
    /// A fresh in-memory service with one administrator account
    pub async fn new() -> Self {
        let key = Key::generate();
        let state = AppState::in_memory(
            EmailPolicy::new(DOMAIN).unwrap(),
            Arc::new(FixedClock(today())),
            key.clone(),
        );

        state
            .directory
            .ensure_account(UserCandidate {
                first_name: Some("Admin".to_string()),
                last_name: Some("User".to_string()),
                dob: Some("1980-01-01".to_string()),
                phone_no: Some("0987654321".to_string()),
                email: Some(ADMIN_EMAIL.to_string()),
                role: Some("admin".to_string()),
                password: Some(ADMIN_PASSWORD.to_string()),
            })
            .await
            .unwrap();

        Self {
            app: create_router(state.clone()),
            state,
            key,
            cookies: BTreeMap::new(),
        }
    }

    /// A second client for the same service, without cookies
    pub fn fork(&self) -> Self {
        Self {
            state: self.state.clone(),
            app: self.app.clone(),
            key: self.key.clone(),
            cookies: BTreeMap::new(),
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, Body::empty()).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = serde_urlencoded::to_string(fields).unwrap();
        self.send(
            Method::POST,
            uri,
            Some("application/x-www-form-urlencoded"),
            Body::from(body),
        )
        .await
    }

    pub async fn delete_json(&mut self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.send(
            Method::DELETE,
            uri,
            Some("application/json"),
            Body::from(body.to_string()),
        )
        .await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.post_form("/login", &[("email", email), ("password", password)])
            .await
    }

    pub async fn login_admin(&mut self) -> TestResponse {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Register through the public form
    pub async fn register(&mut self, email: &str, phone: &str, password: &str) -> TestResponse {
        self.post_form(
            "/register",
            &[
                ("first-name", "Alice"),
                ("last-name", "Smith"),
                ("dob", "1995-05-05"),
                ("phone", phone),
                ("email", email),
                ("role", "user"),
                ("password", password),
            ],
        )
        .await
    }

    /// Create an employee directly through the directory
    pub async fn employee(&self, email: &str, phone: &str) -> UserId {
        self.state
            .directory
            .administrator_add(UserCandidate {
                first_name: Some("Emp".to_string()),
                last_name: Some(email.split('@').next().unwrap_or_default().to_string()),
                dob: None,
                phone_no: Some(phone.to_string()),
                email: Some(email.to_string()),
                role: None,
                password: Some("password".to_string()),
            })
            .await
            .unwrap()
    }

    /// The session as the server would decode it from our cookies
    pub fn session(&self) -> Session {
        let mut headers = HeaderMap::new();
        if let Some(value) = self.cookie_header() {
            headers.insert(header::COOKIE, value);
        }
        session::load(&PrivateCookieJar::from_headers(&headers, self.key.clone()))
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    fn cookie_header(&self) -> Option<HeaderValue> {
        if self.cookies.is_empty() {
            return None;
        }
        let value = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        Some(HeaderValue::from_str(&value).unwrap())
    }

    async fn send(
        &mut self,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: Body,
    ) -> TestResponse {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(cookies) = self.cookie_header() {
            request = request.header(header::COOKIE, cookies);
        }

        let response = self
            .app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let raw = set_cookie.to_str().unwrap();
            let pair = raw.split(';').next().unwrap_or_default();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            if value.is_empty() {
                self.cookies.remove(name.trim());
            } else {
                self.cookies.insert(name.trim().to_string(), value.to_string());
            }
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            location,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}
