// src/handlers/user.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use axum_extra::extract::{CookieJar, WithRejection};
use serde_json::json;
use validator::Validate;

use super::auth::normalize_email;
use crate::{
    error::AppError,
    models::user::{UpdateUserRequest, UserPatch},
    state::AppState,
    utils::{
        hash::hash_password,
        jwt::{Claims, cleared_session_cookie},
    },
};

type IdPath = WithRejection<Path<i64>, AppError>;

/// Public profile of any user, e.g. the owner of a listing being viewed.
pub async fn get_user(
    State(state): State<AppState>,
    WithRejection(Path(id), _): IdPath,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .users
        .find_user(id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Updates the caller's own profile.
/// Only the fields present in the body change; a new password is re-hashed.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateUserRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    claims.ensure_owner(id, "You can only update your own account")?;
    payload.validate()?;

    let password_hash = payload
        .password
        .as_deref()
        .map(hash_password)
        .transpose()?;

    let patch = UserPatch {
        username: payload.username,
        email: payload.email.as_deref().map(normalize_email),
        password_hash,
        avatar: payload.avatar,
    };

    let user = state
        .users
        .update_user(id, patch)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = id, "profile updated");
    Ok(Json(user))
}

/// Deletes the caller's own account together with all of their listings,
/// and ends the session.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    jar: CookieJar,
    WithRejection(Path(id), _): IdPath,
) -> Result<impl IntoResponse, AppError> {
    claims.ensure_owner(id, "You can only delete your own account")?;

    if !state.users.delete_user(id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = id, "account deleted");
    Ok((
        jar.add(cleared_session_cookie()),
        Json(json!({
            "success": true,
            "message": "User has been deleted!"
        })),
    ))
}

/// Lists every listing owned by the caller (no pagination).
pub async fn list_user_listings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): IdPath,
) -> Result<impl IntoResponse, AppError> {
    claims.ensure_owner(id, "You can only view your own listings")?;

    let listings = state.listings.listings_by_owner(id).await?;

    Ok(Json(listings))
}
