use std::sync::Arc;

use axum::{
    extract::Query,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    db::walletdb::WalletExt,
    dtos::{
        commondtos::{ApiResponse, PageQueryDto, PaginatedResponse, DEFAULT_PAGE_LIMIT},
        walletdtos::*,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    service::storage::Bucket,
    AppState,
};

pub fn wallet_handler() -> Router {
    Router::new()
        .route("/", get(get_wallet))
        .route("/transactions", get(get_transactions))
        .route("/topups", get(list_topups).post(request_topup))
        .route("/refund-requests", get(list_refund_requests).post(request_refund))
}

pub async fn get_wallet(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let wallet = app_state.db_client.get_or_create_wallet(user.user.id).await?;

    Ok(Json(ApiResponse::success(
        "Wallet retrieved",
        WalletResponseDto::from_wallet(wallet, user.user.locale),
    )))
}

pub async fn get_transactions(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(params): Query<PageQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (transactions, total) = app_state.db_client
        .get_wallet_transactions(user.user.id, params.page(), params.limit())
        .await?;

    Ok(Json(PaginatedResponse::new(transactions, total, params.page(), params.limit())))
}

pub async fn request_topup(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateTopupDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let bytes = body.receipt.decode()?;
    let receipt_path = app_state.storage
        .upload(
            Bucket::Receipts,
            user.user.id,
            &body.receipt.file_name,
            &body.receipt.content_type,
            &bytes,
        )
        .await?;

    let request = app_state.wallet_service
        .request_topup(user.user.id, body.amount, &receipt_path)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success("Top-up request submitted", request))))
}

pub async fn list_topups(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(params): Query<RequestStatusQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    let (requests, total) = app_state.db_client
        .get_topup_requests(Some(user.user.id), params.status, page, limit)
        .await?;

    Ok(Json(PaginatedResponse::new(requests, total, page, limit)))
}

pub async fn request_refund(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateRefundRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let request = app_state.wallet_service
        .request_refund(
            user.user.id,
            body.amount,
            &body.bank_name,
            &body.account_holder,
            &body.iban,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success("Refund request submitted", request))))
}

pub async fn list_refund_requests(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(params): Query<RequestStatusQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    let (requests, total) = app_state.db_client
        .get_refund_requests(Some(user.user.id), params.status, page, limit)
        .await?;

    Ok(Json(PaginatedResponse::new(requests, total, page, limit)))
}
