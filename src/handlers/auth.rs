// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::{CookieJar, WithRejection};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{
        CreateUserRequest, DEFAULT_AVATAR, LoginRequest, NewUser, OAuthRequest, User,
        username_from_display_name,
    },
    state::AppState,
    utils::{
        hash::{hash_password, random_token, verify_password},
        jwt::{cleared_session_cookie, session_cookie, sign_jwt},
    },
};

type JsonBody<T> = WithRejection<Json<T>, AppError>;

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn signup(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;

    let user = state
        .users
        .create_user(NewUser {
            username: payload.username,
            email: normalize_email(&payload.email),
            password_hash: hashed_password,
            avatar: DEFAULT_AVATAR.to_string(),
        })
        .await
        .inspect_err(|e| tracing::warn!("Failed to register user: {:?}", e))?;

    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user by email and password.
///
/// On success the signed session token is set as an HTTP-only cookie and the
/// user object (excluding password) is returned.
pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): JsonBody<LoginRequest>,
) -> Result<(CookieJar, Json<User>), AppError> {
    payload.validate()?;

    let user = state
        .users
        .find_user_by_email(&normalize_email(&payload.email))
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Wrong credentials".to_string()));
    }

    start_session(&state, jar, user)
}

/// OAuth callback: signs in the account owning the email, creating it on first use.
///
/// New accounts get a random password that is hashed and never handed out,
/// so they can only sign in through the provider until they set one.
pub async fn google(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): JsonBody<OAuthRequest>,
) -> Result<(CookieJar, Json<User>), AppError> {
    payload.validate()?;
    let email = normalize_email(&payload.email);

    let user = match state.users.find_user_by_email(&email).await? {
        Some(user) => user,
        None => {
            let password_hash = hash_password(&random_token(16))?;
            let suffix = random_token(4).to_lowercase();
            let user = state
                .users
                .create_user(NewUser {
                    username: username_from_display_name(&payload.name, &suffix),
                    email,
                    password_hash,
                    avatar: payload
                        .photo
                        .unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
                })
                .await?;
            tracing::info!(user_id = user.id, "user registered through oauth");
            user
        }
    };

    start_session(&state, jar, user)
}

/// Clears the session cookie.
pub async fn signout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.add(cleared_session_cookie()),
        Json(json!({
            "success": true,
            "message": "User has been logged out!"
        })),
    )
}

fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: User,
) -> Result<(CookieJar, Json<User>), AppError> {
    let token = sign_jwt(user.id, &state.config.jwt_secret, state.config.jwt_expiration)?;
    tracing::debug!(user_id = user.id, "session started");
    Ok((jar.add(session_cookie(token, &state.config)), Json(user)))
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
