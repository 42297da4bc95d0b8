use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::constants::*;
use crate::database::{is_unique_violation, truncate_millis};
use crate::error::{ApiError, ApiJson};
use crate::models::{AuthResponse, Identity, LoginPayload, PublicUser, RegisterPayload};
use crate::password::{self, blocking};
use crate::response::{Envelope, ok};
use crate::token::{TokenError, TokenService};
use crate::users::UserStore;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{}", ERR_DUPLICATE_USER)]
    DuplicateUser,
    #[error("{}", ERR_INVALID_CREDENTIALS)]
    InvalidCredentials,
    #[error("Password must be at least {} characters long", MIN_PASSWORD_LENGTH)]
    WeakPassword,
    #[error("{0}")]
    InvalidUsername(String),
    #[error("{0}")]
    InvalidName(String),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// A freshly authenticated user and the token proving it.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: PublicUser,
}

pub fn validate_username(username: &str) -> Result<(), AuthError> {
    let length = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&length) {
        return Err(AuthError::InvalidUsername(format!(
            "Username must be between {} and {} characters",
            MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AuthError::InvalidUsername(
            "Username can only contain alphanumeric characters, underscores, and hyphens"
                .to_string(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

fn normalize_name(name: Option<&str>) -> Result<Option<String>, AuthError> {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) if n.chars().count() > MAX_DISPLAY_NAME_LENGTH => Err(AuthError::InvalidName(
            format!("Name must be at most {} characters", MAX_DISPLAY_NAME_LENGTH),
        )),
        other => Ok(other.map(str::to_string)),
    }
}

/// Registration and login. Usernames are matched exactly (case-sensitive)
/// after trimming.
pub struct AuthService {
    users: UserStore,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(users: UserStore, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<AuthSession, AuthError> {
        let username = username.trim();
        validate_username(username)?;
        validate_password(password)?;
        let name = normalize_name(name)?;

        if self.users.exists(username).await? {
            return Err(AuthError::DuplicateUser);
        }

        let plain = password.to_string();
        let hash = blocking(move || password::hash_password(&plain)).await?;
        let id = Uuid::new_v4().to_string();
        let created_at = truncate_millis(OffsetDateTime::now_utc());

        // A concurrent registration may still win the race; the UNIQUE
        // constraint settles it.
        let user = self
            .users
            .insert(&id, username, name.as_deref(), &hash, created_at)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AuthError::DuplicateUser
                } else {
                    AuthError::Internal(e)
                }
            })?;

        info!(user_id = %user.id, username = %user.username, "user registered");
        self.session_for(user.public())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        let username = username.trim();
        let user = self.users.find_by_username(username).await?;

        let plain = password.to_string();
        let stored_hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => password::dummy_hash()?.to_string(),
        };
        let verified = blocking(move || password::verify_password(&plain, &stored_hash)).await?;

        match user {
            Some(user) if verified => {
                info!(user_id = %user.id, "user logged in");
                self.session_for(user.public())
            }
            _ => {
                warn!(username = %username, "failed login attempt");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        self.tokens.verify(token)
    }

    fn session_for(&self, user: PublicUser) -> Result<AuthSession, AuthError> {
        let token = self.tokens.issue(&Identity {
            user_id: user.id.clone(),
            username: user.username.clone(),
        })?;
        Ok(AuthSession { token, user })
    }
}

/// Authenticated caller, extracted from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ApiError::MissingToken)?;
        let identity = state.auth.verify(token).map_err(|e| {
            debug!(reason = %e, "rejected bearer token");
            ApiError::InvalidToken
        })?;
        Ok(AuthUser(identity))
    }
}

fn require_credentials(username: &str, password: &str) -> Result<(), ApiError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(ApiError::bad_request(ERR_MISSING_CREDENTIALS));
    }
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterPayload>,
) -> Result<(StatusCode, Json<Envelope<AuthResponse>>), ApiError> {
    require_credentials(&payload.username, &payload.password)?;

    let session = state
        .auth
        .register(&payload.username, &payload.password, payload.name.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        ok(AuthResponse {
            token: session.token,
            user: session.user,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginPayload>,
) -> Result<Json<Envelope<AuthResponse>>, ApiError> {
    require_credentials(&payload.username, &payload.password)?;

    let session = state
        .auth
        .login(&payload.username, &payload.password)
        .await?;

    Ok(ok(AuthResponse {
        token: session.token,
        user: session.user,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers_with("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers_with("abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("bob").is_ok());
        assert!(validate_username("alice_smith-2").is_ok());
        assert!(matches!(
            validate_username("ab"),
            Err(AuthError::InvalidUsername(_))
        ));
        assert!(matches!(
            validate_username("has space"),
            Err(AuthError::InvalidUsername(_))
        ));
        assert!(validate_username(&"x".repeat(MAX_USERNAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("secret").is_ok());
        assert!(matches!(
            validate_password("12345"),
            Err(AuthError::WeakPassword)
        ));
    }

    #[test]
    fn display_name_is_trimmed_and_optional() {
        assert_eq!(normalize_name(Some("  Alice  ")).unwrap(), Some("Alice".to_string()));
        assert_eq!(normalize_name(Some("   ")).unwrap(), None);
        assert_eq!(normalize_name(None).unwrap(), None);
        assert!(normalize_name(Some(&"n".repeat(MAX_DISPLAY_NAME_LENGTH + 1))).is_err());
    }
}
