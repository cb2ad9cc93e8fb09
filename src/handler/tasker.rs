use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{reviewdb::ReviewExt, taskerdb::TaskerExt, userdb::UserExt},
    dtos::{
        commondtos::{ApiResponse, FileUploadDto, PageQueryDto, PaginatedResponse, DEFAULT_PAGE_LIMIT},
        taskerdtos::*,
        userdtos::PublicUserDto,
    },
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    service::storage::Bucket,
    utils::sanitize::plain_text,
    AppState,
};

const LATEST_REVIEWS: u32 = 5;

pub fn tasker_handler() -> Router {
    let me = Router::new()
        .route("/profile", get(get_my_profile).put(update_my_profile))
        .route("/availability", put(update_availability))
        .route("/id-document", post(upload_id_document))
        .route("/services", get(get_my_services).post(create_service))
        .route("/services/:id", put(update_service).delete(delete_service))
        .layer(middleware::from_fn(|req: Request, next: Next| {
            role_check(req, next, vec![UserRole::Tasker])
        }));

    Router::new()
        .nest("/me", me)
        .route("/:id", get(get_public_profile))
        .route("/:id/reviews", get(get_tasker_reviews))
}

pub fn services_handler() -> Router {
    Router::new().route("/", get(search_services))
}

pub async fn get_my_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state.db_client
        .get_tasker_profile(user.user.id)
        .await?
        .ok_or_else(|| HttpError::not_found("Tasker profile not found"))?;

    Ok(Json(ApiResponse::success("Tasker profile retrieved", profile)))
}

pub async fn update_my_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateTaskerProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let profile = app_state.db_client
        .update_tasker_profile(
            user.user.id,
            body.bio.map(|bio| plain_text(&bio)),
            body.experience_years,
            body.service_cities,
        )
        .await?;

    Ok(Json(ApiResponse::success("Tasker profile updated", profile)))
}

pub async fn update_availability(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateAvailabilityDto>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state.db_client
        .set_availability(user.user.id, body.is_available)
        .await?;

    Ok(Json(ApiResponse::success("Availability updated", profile)))
}

pub async fn upload_id_document(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<FileUploadDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let bytes = body.decode()?;
    let path = app_state.storage
        .upload(Bucket::IdDocuments, user.user.id, &body.file_name, &body.content_type, &bytes)
        .await?;

    let profile = app_state.db_client
        .submit_id_document(user.user.id, &path)
        .await?;

    tracing::info!("Tasker {} submitted an ID document for review", user.user.id);

    Ok(Json(ApiResponse::success("ID document submitted for review", profile)))
}

pub async fn get_my_services(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let services = app_state.db_client
        .get_tasker_services(user.user.id, false)
        .await?;

    Ok(Json(ApiResponse::success("Services retrieved", services)))
}

pub async fn create_service(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateServiceDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let service = app_state.db_client
        .create_service(user.user.id, body, MAX_ACTIVE_SERVICES)
        .await?
        .ok_or_else(|| {
            HttpError::conflict(format!("You can have at most {} active services", MAX_ACTIVE_SERVICES))
        })?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success("Service created", service))))
}

pub async fn update_service(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(service_id): Path<Uuid>,
    Json(body): Json<UpdateServiceDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let service = app_state.db_client
        .update_service(user.user.id, service_id, body)
        .await?
        .ok_or_else(|| HttpError::not_found("Service not found"))?;

    Ok(Json(ApiResponse::success("Service updated", service)))
}

pub async fn delete_service(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(service_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let deactivated = app_state.db_client
        .deactivate_service(user.user.id, service_id)
        .await?;

    if !deactivated {
        return Err(HttpError::not_found("Service not found"));
    }

    Ok(Json(ApiResponse::<()>::message_only("Service removed")))
}

pub async fn get_public_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(tasker_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state.db_client
        .get_user(Some(tasker_id), None, None)
        .await?
        .filter(|user| user.role == UserRole::Tasker && !user.is_suspended)
        .ok_or_else(|| HttpError::not_found("Tasker not found"))?;

    let profile = app_state.db_client
        .get_tasker_profile(tasker_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Tasker not found"))?;

    let services = app_state.db_client.get_tasker_services(tasker_id, true).await?;
    let (latest_reviews, _) = app_state.db_client
        .get_tasker_reviews(tasker_id, 1, LATEST_REVIEWS)
        .await?;

    Ok(Json(ApiResponse::success(
        "Tasker profile retrieved",
        TaskerPublicProfileDto {
            user: PublicUserDto::from_user(&user),
            profile,
            services,
            latest_reviews,
        },
    )))
}

pub async fn get_tasker_reviews(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(tasker_id): Path<Uuid>,
    Query(params): Query<PageQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (reviews, total) = app_state.db_client
        .get_tasker_reviews(tasker_id, params.page(), params.limit())
        .await?;

    Ok(Json(PaginatedResponse::new(reviews, total, params.page(), params.limit())))
}

pub async fn search_services(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<SearchServicesDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if let (Some(min), Some(max)) = (params.min_price, params.max_price) {
        if min > max {
            return Err(HttpError::bad_request("min_price cannot exceed max_price"));
        }
    }

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    let (services, total) = app_state.db_client
        .search_services(&params, page, limit)
        .await?;

    Ok(Json(PaginatedResponse::new(services, total, page, limit)))
}
