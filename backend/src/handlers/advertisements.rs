use axum::{
    extract::{rejection::JsonRejection, FromRequest, Multipart, Path, Query, Request, State},
    http::{header, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Admin;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{AdStatus, NewAdvertisement, StatusUpdate};
use crate::uploads;

#[derive(Debug, Default, Deserialize)]
pub struct AdFilter {
    pub status: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<AdFilter>,
) -> ServiceResult<Json<Value>> {
    let page = state.ads.list(filter.status.as_deref()).await?;
    Ok(Json(json!({
        "success": true,
        "count": page.data.len(),
        "total": page.total,
        "data": page.data,
    })))
}

/// Accepts either a JSON body or a multipart form with an `image` file.
pub async fn create(
    State(state): State<AppState>,
    request: Request,
) -> ServiceResult<(StatusCode, Json<Value>)> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let (input, image) = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ServiceError::Validation(e.body_text()))?;
        uploads::read_ad_form(
            multipart,
            &state.config.uploads_dir,
            state.config.max_upload_bytes,
        )
        .await?
    } else {
        let payload: Result<Json<NewAdvertisement>, JsonRejection> =
            Json::from_request(request, &state).await;
        let Json(input) = payload?;
        (input, None)
    };

    let ad = match state.ads.create(input, image.clone()).await {
        Ok(ad) => ad,
        Err(e) => {
            if let Some(path) = image {
                uploads::discard(&state.config.uploads_dir, &path).await;
            }
            return Err(e);
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Advertisement created",
            "data": ad,
        })),
    ))
}

/// Fetching one advertisement counts as a view.
pub async fn view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    let ad = state.ads.record_view(&id).await?;
    Ok(Json(json!({ "success": true, "data": ad })))
}

pub async fn click(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    let ad = state.ads.record_click(&id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Click recorded",
        "data": { "id": ad.id, "title": ad.title, "clicks": ad.clicks },
    })))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> ServiceResult<Json<Value>> {
    let Json(update) = payload?;
    let change = state.ads.set_status(&id, update.status.as_deref()).await?;

    let message = match change.new_status {
        AdStatus::Active => "Advertisement activated",
        AdStatus::Inactive => "Advertisement deactivated",
    };
    Ok(Json(json!({
        "success": true,
        "message": message,
        "oldStatus": change.old_status,
        "newStatus": change.new_status,
        "data": change.data,
    })))
}

pub async fn delete(
    State(state): State<AppState>,
    Admin(authorized): Admin,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    let removed = state.ads.delete(&id, authorized).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Advertisement deleted",
        "deletedAd": removed,
    })))
}
