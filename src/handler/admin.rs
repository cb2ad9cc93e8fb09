use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{
        bookingdb::BookingExt, contentdb::ContentExt, taskerdb::TaskerExt, userdb::UserExt,
        walletdb::WalletExt,
    },
    dtos::{
        bookingdtos::ResolveDisputeDto,
        commondtos::{ApiResponse, PageQueryDto, PaginatedResponse, DEFAULT_PAGE_LIMIT},
        contentdtos::UpsertContentDto,
        taskerdtos::VerificationReviewDto,
        userdtos::{AdminUserQueryDto, FilterUserDto, SuspendUserDto},
        walletdtos::{RequestStatusQueryDto, ReviewRequestDto},
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::bookingmodel::BookingStatus,
    utils::{locale::Locale, sanitize::plain_text},
    AppState,
};

pub fn admin_handler() -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id/suspend", put(suspend_user))
        .route("/taskers/verifications", get(list_pending_verifications))
        .route("/taskers/:id/verification", put(review_verification))
        .route("/bookings/disputed", get(list_disputed_bookings))
        .route("/bookings/:id/resolve", put(resolve_dispute))
        .route("/wallet/topups", get(list_topups))
        .route("/wallet/topups/:id", put(review_topup))
        .route("/wallet/refund-requests", get(list_refund_requests))
        .route("/wallet/refund-requests/:id", put(review_refund))
        .route("/content/:slug/:locale", put(upsert_content).delete(delete_content))
}

fn clean_note(note: Option<String>) -> Option<String> {
    note.map(|note| plain_text(&note))
        .filter(|note| !note.is_empty())
}

/// Slugs are lowercase words joined by single hyphens.
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 100
        && slug
            .split('-')
            .all(|word| !word.is_empty() && word.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()))
}

fn path_locale(value: &str) -> Result<Locale, HttpError> {
    Locale::try_parse(value)
        .filter(|locale| locale.to_str() == value)
        .ok_or_else(|| HttpError::bad_request(format!("Unsupported locale: {}", value)))
}

pub async fn list_users(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<AdminUserQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    let users = app_state.db_client
        .get_users(page, limit as usize, params.role)
        .await?;
    let total = app_state.db_client.get_user_count(params.role).await?;

    Ok(Json(PaginatedResponse::new(
        FilterUserDto::filter_users(&users),
        total,
        page,
        limit,
    )))
}

pub async fn suspend_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(admin): Extension<JWTAuthMiddeware>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<SuspendUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    if user_id == admin.user.id {
        return Err(HttpError::bad_request("You cannot suspend your own account"));
    }

    let user = app_state.db_client
        .set_suspended(user_id, body.suspended)
        .await?;

    tracing::info!(
        "User {} {} by admin {}",
        user.id,
        if body.suspended { "suspended" } else { "reinstated" },
        admin.user.id
    );

    let message = if body.suspended { "User suspended" } else { "User reinstated" };
    Ok(Json(ApiResponse::success(message, FilterUserDto::filter_user(&user))))
}

pub async fn list_pending_verifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<PageQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let pending = app_state.db_client
        .get_pending_verifications(params.page(), params.limit())
        .await?;

    Ok(Json(ApiResponse::success("Pending verifications retrieved", pending)))
}

pub async fn review_verification(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(admin): Extension<JWTAuthMiddeware>,
    Path(tasker_id): Path<Uuid>,
    Json(body): Json<VerificationReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    let note = clean_note(body.note);

    let profile = match app_state.db_client
        .review_verification(tasker_id, body.approved, note.clone())
        .await?
    {
        Some(profile) => profile,
        None => {
            return Err(match app_state.db_client.get_tasker_profile(tasker_id).await? {
                Some(_) => HttpError::conflict("There is no pending verification for this tasker"),
                None => HttpError::not_found("Tasker not found"),
            })
        }
    };

    tracing::info!(
        "Verification for {} {} by admin {}",
        tasker_id,
        if body.approved { "approved" } else { "rejected" },
        admin.user.id
    );

    app_state.notification_service
        .notify_verification_reviewed(tasker_id, body.approved, note.as_deref())
        .await;

    Ok(Json(ApiResponse::success("Verification reviewed", profile)))
}

pub async fn list_disputed_bookings(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<PageQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (bookings, total) = app_state.db_client
        .get_bookings_by_status(BookingStatus::Disputed, params.page(), params.limit())
        .await?;

    Ok(Json(PaginatedResponse::new(bookings, total, params.page(), params.limit())))
}

pub async fn resolve_dispute(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(admin): Extension<JWTAuthMiddeware>,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<ResolveDisputeDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let booking = app_state.booking_service
        .resolve_dispute(&admin.user, booking_id, body.outcome, clean_note(body.note))
        .await?;

    Ok(Json(ApiResponse::success("Dispute resolved", booking)))
}

pub async fn list_topups(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<RequestStatusQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    let (requests, total) = app_state.db_client
        .get_topup_requests(None, params.status, page, limit)
        .await?;

    Ok(Json(PaginatedResponse::new(requests, total, page, limit)))
}

pub async fn review_topup(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(admin): Extension<JWTAuthMiddeware>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ReviewRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    let note = clean_note(body.note);

    let request = app_state.wallet_service
        .review_topup(admin.user.id, request_id, body.approved, note.as_deref())
        .await?;

    Ok(Json(ApiResponse::success("Top-up reviewed", request)))
}

pub async fn list_refund_requests(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<RequestStatusQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    let (requests, total) = app_state.db_client
        .get_refund_requests(None, params.status, page, limit)
        .await?;

    Ok(Json(PaginatedResponse::new(requests, total, page, limit)))
}

pub async fn review_refund(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(admin): Extension<JWTAuthMiddeware>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ReviewRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    let note = clean_note(body.note);

    let request = app_state.wallet_service
        .review_refund(admin.user.id, request_id, body.approved, note.as_deref())
        .await?;

    Ok(Json(ApiResponse::success("Refund request reviewed", request)))
}

pub async fn upsert_content(
    Extension(app_state): Extension<Arc<AppState>>,
    Path((slug, locale)): Path<(String, String)>,
    Json(body): Json<UpsertContentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if !is_valid_slug(&slug) {
        return Err(HttpError::bad_request("Slug must be lowercase words separated by hyphens"));
    }
    let locale = path_locale(&locale)?;

    let body_html = ammonia::clean(&body.body_html);
    let page = app_state.db_client
        .upsert_content_page(&slug, locale, body.title.trim(), &body_html, body.published)
        .await?;

    Ok(Json(ApiResponse::success("Page saved", page)))
}

pub async fn delete_content(
    Extension(app_state): Extension<Arc<AppState>>,
    Path((slug, locale)): Path<(String, String)>,
) -> Result<impl IntoResponse, HttpError> {
    let locale = path_locale(&locale)?;

    let deleted = app_state.db_client.delete_content_page(&slug, locale).await?;
    if !deleted {
        return Err(HttpError::not_found("Page not found"));
    }

    Ok(Json(ApiResponse::<()>::message_only("Page deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs() {
        assert!(is_valid_slug("terms"));
        assert!(is_valid_slug("privacy-policy-2024"));
        assert!(!is_valid_slug("Privacy"));
        assert!(!is_valid_slug("double--hyphen"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn path_locale_must_be_a_bare_code() {
        assert_eq!(path_locale("fr").unwrap(), Locale::Fr);
        assert!(path_locale("fr-FR").is_err());
        assert!(path_locale("es").is_err());
    }

    #[test]
    fn notes_are_plain_text() {
        assert_eq!(clean_note(Some("  ".to_string())), None);
        assert_eq!(clean_note(Some("<b>ok</b>".to_string())).as_deref(), Some("ok"));
    }
}
