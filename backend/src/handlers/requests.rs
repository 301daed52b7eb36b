use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Admin;
use crate::error::ServiceResult;
use crate::models::{NewPropertyRequest, RequestFilter, RequestStatus, StatusUpdate};

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<RequestFilter>,
) -> ServiceResult<Json<Value>> {
    let page = state.requests.list(&filter).await?;
    Ok(Json(json!({
        "success": true,
        "count": page.data.len(),
        "total": page.total,
        "data": page.data,
    })))
}

pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<NewPropertyRequest>, JsonRejection>,
) -> ServiceResult<(StatusCode, Json<Value>)> {
    let Json(input) = payload?;
    let request = state.requests.submit(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Your request was submitted successfully",
            "requestId": request.id,
            "data": request,
        })),
    ))
}

pub async fn view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    let request = state.requests.view(&id).await?;
    Ok(Json(json!({ "success": true, "data": request })))
}

pub async fn transition(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> ServiceResult<Json<Value>> {
    let Json(update) = payload?;
    let outcome = state.requests.transition(&id, update).await?;

    let message = match outcome.new_status {
        RequestStatus::Accepted => "Request accepted",
        RequestStatus::Rejected => "Request rejected",
        _ => "Request is being processed",
    };
    let mut body = json!({
        "success": true,
        "message": message,
        "oldStatus": outcome.old_status,
        "newStatus": outcome.new_status,
        "data": outcome.data,
    });
    if let Some(listing) = outcome.listing {
        body["listing"] = json!(listing);
    }
    Ok(Json(body))
}

pub async fn delete(
    State(state): State<AppState>,
    Admin(authorized): Admin,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    let removed = state.requests.delete(&id, authorized).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Request deleted",
        "deletedRequest": removed,
    })))
}

pub async fn stats(State(state): State<AppState>) -> ServiceResult<Json<Value>> {
    let stats = state.requests.stats().await?;
    Ok(Json(json!({ "success": true, "data": stats })))
}
