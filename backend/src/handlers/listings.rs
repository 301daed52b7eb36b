//! Handlers shared by `/api/houses` and `/api/lands`; the router hands
//! each nest its own [`ListingService`].

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::error::ServiceResult;
use crate::listings::ListingService;
use crate::models::{NewListing, StatusUpdate};

pub async fn list(State(listings): State<ListingService>) -> ServiceResult<Json<Value>> {
    let data = listings.list().await?;
    Ok(Json(json!({
        "success": true,
        "count": data.len(),
        "data": data,
    })))
}

pub async fn create(
    State(listings): State<ListingService>,
    payload: Result<Json<NewListing>, JsonRejection>,
) -> ServiceResult<(StatusCode, Json<Value>)> {
    let Json(input) = payload?;
    let listing = listings.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": format!("The {} was added", listings.kind().entity()),
            "data": listing,
        })),
    ))
}

pub async fn set_status(
    State(listings): State<ListingService>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> ServiceResult<Json<Value>> {
    let Json(update) = payload?;
    let change = listings.set_status(&id, update.status.as_deref()).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("The {} is now {}", listings.kind().entity(), change.new_status),
        "oldStatus": change.old_status,
        "newStatus": change.new_status,
        "data": change.data,
    })))
}
