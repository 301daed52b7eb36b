use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Admin;
use crate::backup;
use crate::error::{ServiceError, ServiceResult};

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "status": "healthy",
        "service": "Property requests API",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now(),
        "dataPath": state.config.data_dir,
        "endpoints": {
            "requests": "/api/requests",
            "advertisements": "/api/advertisements",
            "houses": "/api/houses",
            "lands": "/api/lands",
        },
        "allowedOrigins": state.config.allowed_origins,
    }))
}

/// Returns every collection in one response.
pub async fn backup(
    State(state): State<AppState>,
    Admin(authorized): Admin,
) -> ServiceResult<Json<Value>> {
    if !authorized {
        return Err(ServiceError::Unauthorized("read backups"));
    }

    let data = backup::load_all(&state.store).await?;
    let total = data.total_records();
    Ok(Json(json!({
        "success": true,
        "message": "Backup collected",
        "data": {
            "requests": data.requests,
            "houses": data.houses,
            "lands": data.lands,
            "advertisements": data.advertisements,
            "timestamp": Utc::now(),
            "totalRecords": total,
        },
    })))
}

pub async fn not_found(OriginalUri(uri): OriginalUri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": "Route not found",
            "code": "NOT_FOUND",
            "requestedUrl": uri.to_string(),
        })),
    )
}
