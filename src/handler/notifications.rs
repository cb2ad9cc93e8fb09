use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{delete, get, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::notificationdb::NotificationExt,
    dtos::{
        chatdtos::UnreadCountDto,
        commondtos::{ApiResponse, PaginatedResponse, DEFAULT_PAGE_LIMIT},
        notificationdtos::NotificationQueryDto,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn notification_handler() -> Router {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/read-all", put(mark_all_read))
        .route("/:id/read", put(mark_read))
        .route("/:id", delete(delete_notification))
}

pub async fn list_notifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(params): Query<NotificationQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    let (notifications, total) = app_state.db_client
        .get_user_notifications(user.user.id, params.unread_only.unwrap_or(false), page, limit)
        .await?;

    Ok(Json(PaginatedResponse::new(notifications, total, page, limit)))
}

pub async fn unread_count(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let unread_count = app_state.db_client
        .get_unread_notification_count(user.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Unread count retrieved", UnreadCountDto { unread_count })))
}

pub async fn mark_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let notification = app_state.db_client
        .mark_notification_read(notification_id, user.user.id)
        .await?
        .ok_or_else(|| HttpError::not_found("Notification not found"))?;

    Ok(Json(ApiResponse::success("Notification marked as read", notification)))
}

pub async fn mark_all_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let updated = app_state.db_client
        .mark_all_notifications_read(user.user.id)
        .await?;

    Ok(Json(ApiResponse::success("All notifications marked as read", updated)))
}

pub async fn delete_notification(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let deleted = app_state.db_client
        .delete_notification(notification_id, user.user.id)
        .await?;

    if !deleted {
        return Err(HttpError::not_found("Notification not found"));
    }

    Ok(Json(ApiResponse::<()>::message_only("Notification deleted")))
}
