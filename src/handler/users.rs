use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{addressdb::AddressExt, userdb::UserExt},
    dtos::{
        commondtos::{ApiResponse, FileUploadDto},
        userdtos::{
            AddressDto, AddressListDto, BecomeTaskerDto, FilterUserDto, Response,
            UpdateProfileDto, UserData, UserPasswordUpdateDto, UserResponseDto,
        },
    },
    error::{ErrorMessage, HttpError},
    middleware::JWTAuthMiddeware,
    models::usermodel::UserRole,
    service::storage::Bucket,
    utils::{password, sanitize::plain_text},
    AppState,
};

pub fn users_handler() -> Router {
    Router::new()
        .route("/me", get(get_me).put(update_profile))
        .route("/password", put(update_user_password))
        .route("/avatar", put(upload_avatar))
        .route("/addresses", get(get_addresses).post(create_address))
        .route("/addresses/:id", put(update_address).delete(delete_address))
        .route("/addresses/:id/default", put(set_default_address))
        .route("/become-tasker", axum::routing::post(become_tasker))
}

fn user_response(user: &crate::models::usermodel::User) -> Json<UserResponseDto> {
    Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(user),
        },
    })
}

pub async fn get_me(
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(user_response(&user.user))
}

pub async fn update_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let updated = app_state.db_client
        .update_profile(
            user.user.id,
            body.name.map(|name| name.trim().to_string()),
            body.phone,
            body.bio.map(|bio| plain_text(&bio)),
            body.locale,
        )
        .await?;

    Ok(user_response(&updated))
}

pub async fn update_user_password(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UserPasswordUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let password_match = password::compare(&body.old_password, &user.user.password)
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if !password_match {
        return Err(HttpError::bad_request("Old password is incorrect".to_string()));
    }

    let hash_password = password::hash(&body.new_password)
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    app_state.db_client
        .update_user_password(user.user.id, hash_password)
        .await?;

    Ok(Json(Response {
        message: "Password updated Successfully".to_string(),
        status: "success",
    }))
}

pub async fn upload_avatar(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<FileUploadDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let bytes = body.decode()?;
    let path = app_state.storage
        .upload(Bucket::Avatars, user.user.id, &body.file_name, &body.content_type, &bytes)
        .await?;

    let updated = app_state.db_client
        .update_avatar_path(user.user.id, &path)
        .await?;

    Ok(Json(ApiResponse::success(
        "Avatar updated",
        serde_json::json!({
            "user": FilterUserDto::filter_user(&updated),
            "avatar_url": app_state.storage.public_url(Bucket::Avatars, &path),
        }),
    )))
}

pub async fn get_addresses(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let addresses = app_state.db_client.get_addresses(user.user.id).await?;

    Ok(Json(ApiResponse::success("Addresses retrieved", AddressListDto { addresses })))
}

pub async fn create_address(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<AddressDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let address = app_state.db_client.create_address(user.user.id, body).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success("Address created", address))))
}

pub async fn update_address(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(address_id): Path<Uuid>,
    Json(body): Json<AddressDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let address = app_state.db_client
        .update_address(user.user.id, address_id, body)
        .await?
        .ok_or_else(|| HttpError::not_found("Address not found"))?;

    Ok(Json(ApiResponse::success("Address updated", address)))
}

pub async fn delete_address(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(address_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let deleted = app_state.db_client
        .delete_address(user.user.id, address_id)
        .await?;

    if !deleted {
        return Err(HttpError::not_found("Address not found"));
    }

    Ok(Json(ApiResponse::<()>::message_only("Address deleted")))
}

pub async fn set_default_address(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(address_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let address = app_state.db_client
        .set_default_address(user.user.id, address_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Address not found"))?;

    Ok(Json(ApiResponse::success("Default address updated", address)))
}

fn check_can_become_tasker(role: UserRole) -> Result<(), HttpError> {
    match role {
        UserRole::Tasker => Err(HttpError::conflict("You are already a tasker")),
        UserRole::Admin => Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string())),
        UserRole::Customer => Ok(()),
    }
}

pub async fn become_tasker(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<BecomeTaskerDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    check_can_become_tasker(user.user.role)?;

    let cities: Vec<String> = body.service_cities
        .iter()
        .map(|city| city.trim().to_string())
        .filter(|city| !city.is_empty())
        .collect();

    let (updated, profile) = app_state.db_client
        .become_tasker(user.user.id, plain_text(&body.bio), body.experience_years, cities)
        .await?
        .ok_or_else(|| HttpError::conflict("You are already a tasker"))?;

    tracing::info!("User {} became a tasker", updated.id);

    Ok(Json(ApiResponse::success(
        "You are now a tasker",
        serde_json::json!({
            "user": FilterUserDto::filter_user(&updated),
            "profile": profile,
        }),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_customers_can_become_taskers() {
        assert!(check_can_become_tasker(UserRole::Customer).is_ok());

        let err = check_can_become_tasker(UserRole::Tasker).unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err = check_can_become_tasker(UserRole::Admin).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }
}
