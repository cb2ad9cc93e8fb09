use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{chatdb::ChatExt, userdb::UserExt},
    dtos::{
        chatdtos::*,
        commondtos::{ApiResponse, PageQueryDto, PaginatedResponse},
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::chatmodels::Conversation,
    utils::sanitize::plain_text,
    AppState,
};

pub fn chat_handler() -> Router {
    Router::new()
        .route("/", get(list_conversations).post(create_conversation))
        .route("/unread-count", get(unread_count))
        .route("/:id/messages", get(list_messages).post(send_message))
        .route("/:id/read", put(mark_read))
}

async fn load_conversation(
    app_state: &AppState,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<Conversation, HttpError> {
    let conversation = app_state.db_client
        .get_conversation(conversation_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Conversation not found"))?;

    if !conversation.has_participant(user_id) {
        return Err(HttpError::forbidden("You are not part of this conversation"));
    }

    Ok(conversation)
}

pub async fn create_conversation(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateConversationDto>,
) -> Result<impl IntoResponse, HttpError> {
    if body.other_user_id == user.user.id {
        return Err(HttpError::bad_request("You cannot start a conversation with yourself"));
    }

    app_state.db_client
        .get_user(Some(body.other_user_id), None, None)
        .await?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    let conversation = app_state.db_client
        .get_or_create_conversation(user.user.id, body.other_user_id, body.job_id, body.booking_id)
        .await?;

    Ok(Json(ApiResponse::success("Conversation ready", conversation)))
}

pub async fn list_conversations(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let conversations = app_state.db_client
        .get_user_conversations(user.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Conversations retrieved", conversations)))
}

pub async fn unread_count(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let unread_count = app_state.db_client
        .get_unread_message_count(user.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Unread count retrieved", UnreadCountDto { unread_count })))
}

pub async fn list_messages(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(conversation_id): Path<Uuid>,
    Query(params): Query<PageQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let conversation = load_conversation(&app_state, conversation_id, user.user.id).await?;

    let (messages, total) = app_state.db_client
        .get_messages(conversation.id, params.page(), params.limit())
        .await?;

    Ok(Json(PaginatedResponse::new(messages, total, params.page(), params.limit())))
}

pub async fn send_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(conversation_id): Path<Uuid>,
    Json(body): Json<SendMessageDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let conversation = load_conversation(&app_state, conversation_id, user.user.id).await?;

    let content = plain_text(&body.content);
    if content.is_empty() {
        return Err(HttpError::bad_request("Message cannot be empty"));
    }

    let message = app_state.db_client
        .create_message(conversation.id, user.user.id, content)
        .await?;

    app_state.notification_service
        .notify_new_message(conversation.other_participant(user.user.id), &user.user.name, &message)
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::success("Message sent", message))))
}

pub async fn mark_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let conversation = load_conversation(&app_state, conversation_id, user.user.id).await?;

    let updated = app_state.db_client
        .mark_messages_read(conversation.id, user.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Messages marked as read", updated)))
}
