use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{Duration, Utc};
use validator::Validate;

use crate::{
    dtos::{
        commondtos::ApiResponse,
        storagedtos::{SignUrlDto, SignedObjectQuery},
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    service::storage::{content_type_for, owner_of, validate_path, Bucket, StorageError},
    AppState,
};

const SIGNED_URL_MINUTES: i64 = 15;

/// Object downloads. Private buckets are guarded by the link signature, not a session.
pub fn storage_handler() -> Router {
    Router::new().route("/:bucket/*path", get(serve_object))
}

pub fn storage_sign_handler() -> Router {
    Router::new().route("/sign", post(sign_object))
}

fn parse_bucket(name: &str) -> Result<Bucket, StorageError> {
    Bucket::parse(name).ok_or_else(|| StorageError::UnknownBucket(name.to_string()))
}

pub async fn serve_object(
    Extension(app_state): Extension<Arc<AppState>>,
    Path((bucket, path)): Path<(String, String)>,
    Query(query): Query<SignedObjectQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let bucket = parse_bucket(&bucket)?;
    let path = path.trim_start_matches('/').to_string();

    if !bucket.is_public() {
        let (Some(expires), Some(signature)) = (query.expires, query.signature.as_deref()) else {
            return Err(StorageError::InvalidSignature.into());
        };
        app_state.storage
            .verify_signature(bucket, &path, expires, signature, Utc::now().timestamp())?;
    }

    let bytes = app_state.storage.read(bucket, &path).await?;
    let cache_control = if bucket.is_public() { "public, max-age=86400" } else { "private, no-store" };

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&path)),
            (header::CACHE_CONTROL, cache_control),
        ],
        bytes,
    ))
}

pub async fn sign_object(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<SignUrlDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let bucket = parse_bucket(&body.bucket)?;
    validate_path(&body.path)?;

    let is_owner = owner_of(&body.path) == Some(user.user.id);
    if !is_owner && !user.user.is_admin() {
        return Err(HttpError::forbidden("You can only share your own files"));
    }

    let signed = app_state.storage
        .signed_url(bucket, &body.path, Duration::minutes(SIGNED_URL_MINUTES))?;

    Ok(Json(ApiResponse::success("Signed URL created", signed)))
}
