use std::sync::Arc;

use axum::{
    extract::{Query, Request},
    http::{header, HeaderMap, HeaderValue},
    middleware,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{Duration, Utc};
use validator::Validate;

use crate::{
    db::{
        cache::CacheHelper,
        userdb::{NewUser, UserExt},
    },
    dtos::userdtos::{
        FilterUserDto, ForgotPasswordRequestDto, LoginUserDto, RegisterUserDto,
        ResetPasswordRequestDto, Response, UserData, UserLoginResponseDto, UserResponseDto,
        VerifyEmailQueryDto,
    },
    error::{ErrorMessage, HttpError},
    mail::mails::{send_forgot_password_email, send_verification_email, send_welcome_email},
    middleware::{auth, extract_token},
    models::usermodel::TokenPurpose,
    utils::{locale::Locale, password, reference::generate_url_token, token},
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/verify", get(verify_email))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/logout", post(logout).layer(middleware::from_fn(auth)))
}

fn token_cookie(value: String, max_age_minutes: i64) -> Result<HeaderValue, HttpError> {
    let cookie = Cookie::build(("token", value))
        .path("/")
        .max_age(time::Duration::minutes(max_age_minutes))
        .http_only(true)
        .build();

    cookie
        .to_string()
        .parse()
        .map_err(|_| HttpError::server_error(ErrorMessage::ServerError.to_string()))
}

pub(crate) fn request_locale(headers: &HeaderMap) -> Locale {
    headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .map(Locale::from_accept_language)
        .unwrap_or_default()
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let email = body.email.trim().to_lowercase();

    let existing_user = app_state.db_client
        .get_user(None, Some(&email), None)
        .await?;

    if existing_user.is_some() {
        return Err(HttpError::unique_constraint_violation(ErrorMessage::EmailExist.to_string()));
    }

    let hashed_password = password::hash(&body.password)
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let verification_token = generate_url_token();
    let locale = body.locale.unwrap_or_else(|| request_locale(&headers));

    let user = app_state.db_client
        .save_user(NewUser {
            name: body.name.trim().to_string(),
            email,
            phone: body.phone,
            password_hash: hashed_password,
            role: body.role,
            locale,
            verification_token: verification_token.clone(),
            token_expires_at: Utc::now() + Duration::hours(24),
        })
        .await
        .map_err(|e| match HttpError::from(e) {
            conflict if conflict.status == axum::http::StatusCode::CONFLICT => {
                HttpError::unique_constraint_violation(ErrorMessage::EmailExist.to_string())
            }
            other => other,
        })?;

    tracing::info!("Registered {} as {}", user.id, user.role.to_str());

    let verification_link = format!(
        "{}/api/auth/verify?token={}",
        app_state.env.app_url.trim_end_matches('/'),
        verification_token
    );
    if let Err(e) = send_verification_email(
        &app_state.mailer,
        &user.email,
        &user.name,
        user.locale,
        &verification_link,
    )
    .await
    {
        tracing::error!("Failed to send verification email to {}: {}", user.id, e);
    }

    Ok((
        axum::http::StatusCode::CREATED,
        Json(UserResponseDto {
            status: "success".to_string(),
            data: UserData { user: FilterUserDto::filter_user(&user) },
        }),
    ))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state.db_client
        .get_user(None, Some(&body.email.trim().to_lowercase()), None)
        .await?
        .ok_or_else(|| HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    let password_matched = password::compare(&body.password, &user.password)
        .map_err(|_| HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        return Err(HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()));
    }

    if user.is_suspended {
        return Err(HttpError::forbidden(ErrorMessage::AccountSuspended.to_string()));
    }

    let token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let cookie = token_cookie(token.clone(), app_state.env.jwt_maxage)?;

    let mut response = Json(UserLoginResponseDto {
        status: "success".to_string(),
        token,
        user: FilterUserDto::filter_user(&user),
    })
    .into_response();
    response.headers_mut().append(header::SET_COOKIE, cookie);

    Ok(response)
}

pub async fn verify_email(
    Query(query_params): Query<VerifyEmailQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query_params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state.db_client
        .get_user(None, None, Some(&query_params.token))
        .await?
        .ok_or_else(|| HttpError::bad_request(ErrorMessage::InvalidToken.to_string()))?;

    if !user.token_valid_for(TokenPurpose::EmailVerification, Utc::now()) {
        return Err(HttpError::bad_request("Invalid or expired verification token"));
    }

    app_state.db_client.verifed_token(&query_params.token).await?;

    if let Err(e) = send_welcome_email(
        &app_state.mailer,
        &user.email,
        &user.name,
        user.locale,
        &app_state.env.frontend_url,
    )
    .await
    {
        tracing::error!("Failed to send welcome email to {}: {}", user.id, e);
    }

    let frontend_url = format!("{}/login", app_state.env.frontend_url.trim_end_matches('/'));
    Ok(Redirect::to(&frontend_url))
}

pub async fn forgot_password(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ForgotPasswordRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let response = Response {
        message: "If that email is registered, a password reset link has been sent.".to_string(),
        status: "success",
    };

    let user = match app_state.db_client
        .get_user(None, Some(&body.email.trim().to_lowercase()), None)
        .await?
    {
        Some(user) => user,
        None => return Ok(Json(response)),
    };

    let reset_token = generate_url_token();
    app_state.db_client
        .update_user_verification_token(
            user.id,
            &reset_token,
            Utc::now() + Duration::minutes(30),
            TokenPurpose::PasswordReset,
        )
        .await?;

    let reset_link = format!(
        "{}/reset-password?token={}",
        app_state.env.frontend_url.trim_end_matches('/'),
        reset_token
    );

    if let Err(e) = send_forgot_password_email(
        &app_state.mailer,
        &user.email,
        &user.name,
        user.locale,
        &reset_link,
    )
    .await
    {
        tracing::error!("Failed to send password reset email to {}: {}", user.id, e);
    }

    Ok(Json(response))
}

pub async fn reset_password(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ResetPasswordRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state.db_client
        .get_user(None, None, Some(&body.token))
        .await?
        .ok_or_else(|| HttpError::bad_request("Invalid or expired token"))?;

    if !user.token_valid_for(TokenPurpose::PasswordReset, Utc::now()) {
        return Err(HttpError::bad_request("Invalid or expired token"));
    }

    let hash_password = password::hash(&body.new_password)
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    app_state.db_client
        .reset_password(user.id, hash_password)
        .await?;

    tracing::info!("Password reset for {}", user.id);

    Ok(Json(Response {
        message: "Password has been successfully reset.".to_string(),
        status: "success",
    }))
}

pub async fn logout(
    Extension(app_state): Extension<Arc<AppState>>,
    cookie_jar: CookieJar,
    req: Request,
) -> Result<impl IntoResponse, HttpError> {
    if let Some(raw_token) = extract_token(&cookie_jar, &req) {
        if let (Some(redis), Ok(claims)) = (
            &app_state.db_client.redis_client,
            token::decode_claims(raw_token, app_state.env.jwt_secret.as_bytes()),
        ) {
            let remaining = claims.exp.saturating_sub(Utc::now().timestamp().max(0) as usize);
            if let Err(e) = CacheHelper::blacklist_token(redis, &claims.jti, remaining).await {
                tracing::warn!("Failed to blacklist token on logout: {}", e);
            }
        }
    }

    let cookie = token_cookie(String::new(), 0)?;

    let mut response = Json(Response {
        message: "Logged out successfully".to_string(),
        status: "success",
    })
    .into_response();
    response.headers_mut().append(header::SET_COOKIE, cookie);

    Ok(response)
}
