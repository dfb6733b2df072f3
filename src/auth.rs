use crate::errors::AppError;
use crate::models::User;
use crate::state::AppState;
use crate::storage::{Collection, Store};
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use rand_core::OsRng;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub username: String,
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

/// Creates the configured admin account when no account exists yet.
pub async fn ensure_admin(store: &Store, username: &str, password: &str) -> Result<(), AppError> {
    let users: Vec<User> = store.read(Collection::Users).await;
    if !users.is_empty() {
        return Ok(());
    }

    let password_hash = hash_password(password).map_err(AppError::internal)?;
    let username = username.to_string();
    store
        .mutate(Collection::Users, move |users: &mut Vec<User>, _| {
            users.push(User {
                username: username.clone(),
                password_hash,
            });
            info!("created admin account {username}");
            Ok(())
        })
        .await
}

pub async fn authenticate(store: &Store, username: &str, password: &str) -> Option<AuthUser> {
    let users: Vec<User> = store.read(Collection::Users).await;
    let user = users.into_iter().find(|user| user.username == username)?;

    let password = password.to_string();
    let stored_hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .unwrap_or(false);

    verified.then(|| AuthUser {
        username: user.username,
    })
}

struct Session {
    username: String,
    expires_at: Instant,
}

/// In-memory session tokens with a fixed lifetime.
pub struct Sessions {
    ttl: Duration,
    inner: RwLock<HashMap<String, Session>>,
}

impl Sessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn issue(&self, username: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let now = Instant::now();
        let mut sessions = self.inner.write().await;
        sessions.retain(|_, session| session.expires_at > now);
        sessions.insert(
            token.clone(),
            Session {
                username: username.to_string(),
                expires_at: now + self.ttl,
            },
        );
        token
    }

    pub async fn resolve(&self, token: &str) -> Option<AuthUser> {
        let sessions = self.inner.read().await;
        let session = sessions.get(token)?;
        if session.expires_at <= Instant::now() {
            return None;
        }
        Some(AuthUser {
            username: session.username.clone(),
        })
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.inner.write().await.remove(token).is_some()
    }
}

/// Bearer token first, then the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

pub async fn current_user(state: &AppState, headers: &HeaderMap) -> Option<AuthUser> {
    let token = token_from_headers(headers)?;
    state.sessions.resolve(&token).await
}

pub fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.as_secs()
    )
}

pub fn cleared_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Guards admin routes; the resolved user is put in the request extensions.
pub async fn require_session(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, AppError> {
    match current_user(&state, req.headers()).await {
        Some(user) => {
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        None => {
            warn!(path = %req.uri().path(), "rejected request without a valid session");
            Err(AppError::unauthorized("Authentication required"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("admin123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("admin123", &hash));
        assert!(!verify_password("admin124", &hash));
        assert!(!verify_password("admin123", "not a hash"));
    }

    #[test]
    fn token_prefers_bearer_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=from-cookie"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("from-cookie"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("from-header"));
    }

    #[tokio::test]
    async fn sessions_expire_and_revoke() {
        let sessions = Sessions::new(Duration::from_secs(60));
        let token = sessions.issue("admin").await;
        assert_eq!(sessions.resolve(&token).await.unwrap().username, "admin");
        assert!(sessions.revoke(&token).await);
        assert!(sessions.resolve(&token).await.is_none());

        let expired = Sessions::new(Duration::ZERO);
        let token = expired.issue("admin").await;
        assert!(expired.resolve(&token).await.is_none());
    }
}
