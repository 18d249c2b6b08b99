// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Evohaus Bridge.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Portal login and session cookie handling

use crate::errors::{PortalError, PortalResult};
use chrono::{DateTime, Utc};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, SET_COOKIE};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, info, warn};

pub const SIGNIN_PATH: &str = "/signinForm.php?mode=ok";

/// Name of the PHP session cookie issued by the portal
pub const SESSION_COOKIE_NAME: &str = "PHPSESSID";

/// An authenticated portal session
#[derive(Clone)]
pub struct Session {
    cookie: String,
    pub authenticated_at: DateTime<Utc>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("cookie", &"<redacted>")
            .field("authenticated_at", &self.authenticated_at)
            .finish()
    }
}

impl Session {
    pub fn new(cookie: impl Into<String>, authenticated_at: DateTime<Utc>) -> Self {
        Self {
            cookie: cookie.into(),
            authenticated_at,
        }
    }

    /// Raw session token
    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    /// Value for the `Cookie` request header
    pub fn cookie_header(&self) -> String {
        format!("{SESSION_COOKIE_NAME}={}", self.cookie)
    }

    /// Attach the session cookie to a request
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match HeaderValue::from_str(&self.cookie_header()) {
            Ok(value) => request.header(COOKIE, value),
            Err(_) => {
                warn!("Session cookie is not a valid header value, sending request without it");
                request
            }
        }
    }
}

/// Pull the session token out of `Set-Cookie` response headers
pub fn extract_session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|raw| {
            let pair = raw.split(';').next()?.trim();
            let (name, value) = pair.split_once('=')?;
            (name.trim() == SESSION_COOKIE_NAME && !value.trim().is_empty())
                .then(|| value.trim().to_owned())
        })
}

/// Logs in against the portal's sign-in form
#[derive(Clone)]
pub struct SessionManager {
    http: Client,
    base_url: String,
    username: String,
    password: String,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// GET the sign-in form for a cookie, then POST the credentials with it
    pub async fn login(&self) -> PortalResult<Session> {
        let url = format!("{}{}", self.base_url, SIGNIN_PATH);
        debug!("Requesting session cookie from {}", url);

        let response = self.http.get(&url).send().await?;
        let cookie = extract_session_cookie(response.headers()).ok_or_else(|| {
            PortalError::Auth(format!(
                "portal did not issue a {SESSION_COOKIE_NAME} cookie (status {})",
                response.status()
            ))
        })?;

        let session = Session::new(cookie, Utc::now());
        let form = [
            ("user", self.username.as_str()),
            ("passwort", self.password.as_str()),
        ];
        let response = session
            .authorize(self.http.post(&url))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortalError::Auth(format!(
                "credential submission returned status {status}"
            )));
        }

        info!("Logged in to Evohaus portal as {}", self.username);
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn test_extract_session_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("lang=de; path=/"));
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("PHPSESSID=abc123; path=/; HttpOnly"),
        );
        assert_eq!(extract_session_cookie(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_extract_session_cookie_missing() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("lang=de; path=/"));
        assert!(extract_session_cookie(&headers).is_none());

        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("PHPSESSID=; path=/"));
        assert!(extract_session_cookie(&headers).is_none());
    }

    #[test]
    fn test_session_debug_redacts_cookie() {
        let session = Session::new("topsecret", Utc::now());
        assert!(!format!("{session:?}").contains("topsecret"));
        assert_eq!(session.cookie_header(), "PHPSESSID=topsecret");
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut server = Server::new_async().await;
        let get = server
            .mock("GET", "/signinForm.php?mode=ok")
            .with_status(200)
            .with_header("set-cookie", "PHPSESSID=sess42; path=/")
            .create_async()
            .await;
        let post = server
            .mock("POST", "/signinForm.php?mode=ok")
            .match_header("cookie", "PHPSESSID=sess42")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("user".into(), "alice".into()),
                Matcher::UrlEncoded("passwort".into(), "pw".into()),
            ]))
            .with_status(200)
            .create_async()
            .await;

        let manager = SessionManager::new(Client::new(), server.url(), "alice", "pw");
        let session = manager.login().await.unwrap();

        assert_eq!(session.cookie(), "sess42");
        get.assert_async().await;
        post.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_without_cookie_fails() {
        let mut server = Server::new_async().await;
        let get = server
            .mock("GET", "/signinForm.php?mode=ok")
            .with_status(200)
            .create_async()
            .await;
        let post = server
            .mock("POST", "/signinForm.php?mode=ok")
            .expect(0)
            .create_async()
            .await;

        let manager = SessionManager::new(Client::new(), server.url(), "alice", "pw");
        let result = manager.login().await;

        assert!(matches!(result, Err(PortalError::Auth(_))));
        get.assert_async().await;
        post.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_rejected_credentials() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/signinForm.php?mode=ok")
            .with_status(200)
            .with_header("set-cookie", "PHPSESSID=sess42; path=/")
            .create_async()
            .await;
        let _post = server
            .mock("POST", "/signinForm.php?mode=ok")
            .with_status(403)
            .create_async()
            .await;

        let manager = SessionManager::new(Client::new(), server.url(), "alice", "wrong");
        assert!(matches!(manager.login().await, Err(PortalError::Auth(_))));
    }
}
