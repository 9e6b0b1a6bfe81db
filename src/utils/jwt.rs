// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

/// Name of the HTTP-only cookie carrying the session token.
pub const SESSION_COOKIE: &str = "access_token";

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| AppError::Forbidden("Malformed session subject".to_string()))
    }

    /// Rejects with `Forbidden` unless the caller is `owner`.
    pub fn ensure_owner(&self, owner: i64, message: &str) -> Result<i64, AppError> {
        let caller = self.user_id()?;
        if caller != owner {
            tracing::warn!(caller, owner, "ownership check failed");
            return Err(AppError::Forbidden(message.to_string()));
        }
        Ok(caller)
    }
}

/// Signs a new JWT for the user.
///
/// Arguments:
/// * `id`: User ID.
/// * `expiration_seconds`: Lifetime of the token.
pub fn sign_jwt(id: i64, secret: &str, expiration_seconds: u64) -> Result<String, AppError> {
    // Calculate expiration: current time + expiration_seconds
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: id.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid; a bad signature or an expired token is `Forbidden`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Forbidden("Forbidden".to_string()))?;

    Ok(token_data.claims)
}

/// Builds the session cookie for a freshly signed token.
pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(config.jwt_expiration as i64))
        .path("/")
        .build()
}

/// Builds a cookie that makes the browser drop the session.
pub fn cleared_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(0))
        .path("/")
        .build()
}

/// Axum Middleware: Authentication.
///
/// Reads the session cookie. If valid, injects `Claims` into the request
/// extensions for handlers to use.
/// Missing cookie returns 401, an invalid or expired token returns 403.
pub async fn auth_middleware(
    State(config): State<Config>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::AuthError("You are not authenticated".to_string()))?;

    let claims = verify_jwt(&token, &config.jwt_secret).inspect_err(|_| {
        tracing::debug!("rejected session token");
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
