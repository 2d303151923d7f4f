//! Login, logout, registration, and the session-token extractors.

use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{async_trait, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    hash_password, issue_token, verify_password, verify_token, Claims, SESSION_COOKIE,
};
use crate::models::{Role, User};
use crate::store::NewUser;

use super::error::ApiError;
use super::responses::ok;
use super::state::AppState;

const SESSION_COOKIE_MAX_AGE_DAYS: i64 = 7;

/// User shape exposed to clients.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self { id: user.id, email: user.email, name: user.name, role: user.role }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::days(SESSION_COOKIE_MAX_AGE_DAYS))
        .build()
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|_| ApiError::Validation("Email and password are required".into()))?;

    let user = state
        .store
        .user_by_email(&req.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;
    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let claims = Claims::new(user.id, user.email.clone(), user.role.clone());
    let token = issue_token(&claims, &state.session_secret)
        .map_err(|_| ApiError::Internal)?;
    let jar = jar.add(session_cookie(token.clone()));

    Ok((
        jar,
        Json(json!({
            "success": true,
            "data": PublicUser::from(user),
            "token": token,
            "message": "Login successful",
        })),
    ))
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    (
        jar,
        Json(json!({ "success": true, "message": "Logged out" })),
    )
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate().map_err(validation_message)?;

    let password_hash = hash_password(&req.password).map_err(|_| ApiError::Internal)?;
    let user = state
        .store
        .create_user(NewUser {
            email: req.email,
            password_hash,
            name: req.name,
            role: Role::Customer.as_str().to_string(),
        })
        .await?;

    Ok((StatusCode::CREATED, ok(PublicUser::from(user))))
}

pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .store
        .user_by_id(user.0.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(ok(PublicUser::from(user)))
}

/// First message out of a `validator` report, as the response error text.
pub fn validation_message(errors: validator::ValidationErrors) -> ApiError {
    let message = errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .filter_map(|e| e.message.as_ref())
        .map(|m| m.to_string())
        .next()
        .unwrap_or_else(|| "Invalid request".to_string());
    ApiError::Validation(message)
}

/// Authenticated requester, from the session cookie or a bearer token.
pub struct CurrentUser(pub Claims);

/// Authenticated requester with the ADMIN role.
pub struct AdminUser(pub Claims);

fn claims_from_parts(parts: &Parts, state: &AppState) -> Result<Claims, ApiError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| {
            parts
                .headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_string)
        })
        .ok_or(ApiError::Unauthorized)?;
    verify_token(&token, &state.session_secret).map_err(|_| ApiError::Unauthorized)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        claims_from_parts(parts, state).map(CurrentUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = claims_from_parts(parts, state)?;
        if !claims.is_admin() {
            return Err(ApiError::Unauthorized);
        }
        Ok(AdminUser(claims))
    }
}
