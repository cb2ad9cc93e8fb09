use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{bookingdb::BookingExt, reviewdb::ReviewExt},
    dtos::{
        bookingdtos::*,
        commondtos::{ApiResponse, PaginatedResponse, DEFAULT_PAGE_LIMIT},
        reviewdtos::CreateReviewDto,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::bookingmodel::BookingStatus,
    utils::sanitize::plain_text,
    AppState,
};

pub fn bookings_handler() -> Router {
    Router::new()
        .route("/", post(create_booking).get(list_bookings))
        .route("/:id", get(get_booking))
        .route("/:id/status", put(update_booking_status))
        .route("/:id/review", post(create_review))
}

pub async fn create_booking(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateBookingDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let booking = app_state.booking_service.create_booking(&user.user, body).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success("Booking requested", booking))))
}

pub async fn list_bookings(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(params): Query<BookingQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    let (bookings, total) = app_state.db_client
        .get_user_bookings(user.user.id, params.side, params.status, page, limit)
        .await?;

    Ok(Json(PaginatedResponse::new(bookings, total, page, limit)))
}

pub async fn get_booking(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let booking = app_state.booking_service
        .get_booking_for(&user.user, booking_id)
        .await?;

    Ok(Json(ApiResponse::success("Booking retrieved", booking)))
}

pub async fn update_booking_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<UpdateBookingStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let reason = body.reason.map(|reason| plain_text(&reason));
    let booking = app_state.booking_service
        .update_status(&user.user, booking_id, body.status, reason)
        .await?;

    Ok(Json(ApiResponse::success("Booking status updated", booking)))
}

pub async fn create_review(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<CreateReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let booking = app_state.db_client
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Booking not found"))?;

    if booking.customer_id != user.user.id {
        return Err(HttpError::forbidden("Only the customer can review this booking"));
    }

    if booking.status != BookingStatus::Completed {
        return Err(HttpError::bad_request("Only completed bookings can be reviewed"));
    }

    if app_state.db_client.get_review_for_booking(booking_id).await?.is_some() {
        return Err(HttpError::conflict("This booking has already been reviewed"));
    }

    let comment = body
        .comment
        .map(|comment| plain_text(&comment))
        .filter(|comment| !comment.is_empty());

    let review = app_state.db_client
        .create_review(booking.id, booking.customer_id, booking.tasker_id, body.rating, comment)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                HttpError::conflict("This booking has already been reviewed")
            }
            _ => HttpError::from(e),
        })?;

    app_state.notification_service
        .notify_review_received(booking.tasker_id, booking.id, review.rating)
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::success("Review submitted", review))))
}
