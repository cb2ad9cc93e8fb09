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
    db::jobdb::JobExt,
    dtos::{
        commondtos::{ApiResponse, PageQueryDto, PaginatedResponse, DEFAULT_PAGE_LIMIT},
        jobdtos::*,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn jobs_handler() -> Router {
    Router::new()
        .route("/", post(create_job).get(list_active_jobs))
        .route("/mine", get(list_my_jobs))
        .route("/applications/mine", get(list_my_applications))
        .route("/:id", get(get_job))
        .route("/:id/status", put(update_job_status))
        .route("/:id/applications", post(apply_to_job).get(list_job_applications))
        .route("/:id/applications/:app_id/accept", put(accept_application))
        .route("/:id/applications/:app_id/withdraw", put(withdraw_application))
}

pub async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state.job_service.create_job(&user.user, body).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success("Job posted", job))))
}

pub async fn list_active_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<SearchJobsDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    let (jobs, total) = app_state.db_client
        .get_active_jobs(&params, page, limit)
        .await?;

    Ok(Json(PaginatedResponse::new(jobs, total, page, limit)))
}

pub async fn list_my_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(params): Query<PageQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (jobs, total) = app_state.db_client
        .get_customer_jobs(user.user.id, params.page(), params.limit())
        .await?;

    Ok(Json(PaginatedResponse::new(jobs, total, params.page(), params.limit())))
}

pub async fn get_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.db_client
        .get_job(job_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Job not found"))?;

    Ok(Json(ApiResponse::success("Job retrieved", job)))
}

pub async fn update_job_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<UpdateJobStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service
        .update_status(&user.user, job_id, body.status)
        .await?;

    Ok(Json(ApiResponse::success("Job status updated", job)))
}

pub async fn apply_to_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<CreateApplicationDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let application = app_state.job_service.apply(&user.user, job_id, body).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success("Application submitted", application))))
}

pub async fn list_job_applications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.db_client
        .get_job(job_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Job not found"))?;

    if job.customer_id != user.user.id {
        return Err(HttpError::forbidden("Only the job owner can see its applications"));
    }

    let applications = app_state.db_client.get_job_applications(job_id).await?;

    Ok(Json(ApiResponse::success("Applications retrieved", applications)))
}

pub async fn list_my_applications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(params): Query<PageQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (applications, total) = app_state.db_client
        .get_tasker_applications(user.user.id, params.page(), params.limit())
        .await?;

    Ok(Json(PaginatedResponse::new(applications, total, params.page(), params.limit())))
}

pub async fn accept_application(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path((job_id, application_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HttpError> {
    let accepted = app_state.job_service
        .accept_application(&user.user, job_id, application_id)
        .await?;

    Ok(Json(ApiResponse::success("Application accepted", accepted)))
}

pub async fn withdraw_application(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path((job_id, application_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HttpError> {
    let application = app_state.job_service
        .withdraw_application(&user.user, job_id, application_id)
        .await?;

    Ok(Json(ApiResponse::success("Application withdrawn", application)))
}
