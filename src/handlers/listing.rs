// src/handlers/listing.rs

use axum::{
    Extension, Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        listing::{Listing, ListingInput},
        search::{ListingQuery, SearchParams},
    },
    state::AppState,
    utils::jwt::Claims,
};

type IdPath = WithRejection<Path<i64>, AppError>;

/// Creates a listing owned by the caller.
pub async fn create_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(payload), _): WithRejection<Json<ListingInput>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.sanitized();
    payload.validate()?;
    let owner = claims.user_id()?;

    let listing = state.listings.create_listing(owner, payload).await?;

    tracing::info!(listing_id = listing.id, owner, "listing created");
    Ok((StatusCode::CREATED, Json(listing)))
}

/// Replaces every mutable field of a listing. Owner only.
pub async fn update_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(payload), _): WithRejection<Json<ListingInput>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_or_404(&state, id).await?;
    claims.ensure_owner(existing.user_ref, "You can only update your own listings")?;
    let payload = payload.sanitized();
    payload.validate()?;

    let listing = state
        .listings
        .replace_listing(id, payload)
        .await?
        .ok_or(AppError::NotFound("Listing not found".to_string()))?;

    Ok(Json(listing))
}

/// Deletes a listing. Owner only.
pub async fn delete_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): IdPath,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_or_404(&state, id).await?;
    claims.ensure_owner(existing.user_ref, "You can only delete your own listings")?;

    state.listings.delete_listing(id).await?;

    tracing::info!(listing_id = id, "listing deleted");
    Ok(Json(json!({
        "success": true,
        "message": "Listing has been deleted!"
    })))
}

/// Retrieves a single listing by ID.
pub async fn get_listing(
    State(state): State<AppState>,
    WithRejection(Path(id), _): IdPath,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(find_or_404(&state, id).await?))
}

/// Public search. Parameters never fail the request; see `ListingQuery::resolve`.
pub async fn search_listings(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, AppError> {
    let params = SearchParams::from_query_string(raw.as_deref().unwrap_or_default());
    let query = ListingQuery::resolve(&params);
    tracing::debug!(?query, "listing search");

    let listings = state.listings.search_listings(&query).await?;

    Ok(Json(listings))
}

async fn find_or_404(state: &AppState, id: i64) -> Result<Listing, AppError> {
    state
        .listings
        .find_listing(id)
        .await?
        .ok_or(AppError::NotFound("Listing not found".to_string()))
}
