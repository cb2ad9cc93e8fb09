// routes.rs
use std::sync::Arc;

use axum::{extract::Request, middleware::{self, Next}, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        admin::admin_handler,
        auth::auth_handler,
        bookings::bookings_handler,
        chat::chat_handler,
        content::content_handler,
        jobs::jobs_handler,
        notifications::notification_handler,
        realtime::realtime_handler,
        storage::{storage_handler, storage_sign_handler},
        tasker::{services_handler, tasker_handler},
        users::users_handler,
        wallet::wallet_handler,
    },
    middleware::{
        auth,
        rate_limit::{auth_rate_limiter, rate_limit_middleware},
        role_check,
    },
    models::usermodel::UserRole,
    AppState,
};

async fn health_check(Extension(app_state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running",
        "cache": app_state.db_client.cache_status(),
        "realtime_subscribers": app_state.realtime.subscriber_count(),
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let auth_limiter = Arc::new(auth_rate_limiter());

    let admin_routes = admin_handler()
        .layer(middleware::from_fn(|req: Request, next: Next| {
            role_check(req, next, vec![UserRole::Admin])
        }))
        .layer(middleware::from_fn(auth));

    let storage_routes = storage_handler()
        .merge(storage_sign_handler().layer(middleware::from_fn(auth)));

    let api_route = Router::new()
        .route("/healthcheck", get(health_check))
        .nest(
            "/auth",
            auth_handler().layer(middleware::from_fn_with_state(auth_limiter, rate_limit_middleware)),
        )
        .nest("/users", users_handler().layer(middleware::from_fn(auth)))
        .nest("/taskers", tasker_handler().layer(middleware::from_fn(auth)))
        .nest("/services", services_handler().layer(middleware::from_fn(auth)))
        .nest("/jobs", jobs_handler().layer(middleware::from_fn(auth)))
        .nest("/bookings", bookings_handler().layer(middleware::from_fn(auth)))
        .nest("/conversations", chat_handler().layer(middleware::from_fn(auth)))
        .nest("/notifications", notification_handler().layer(middleware::from_fn(auth)))
        .nest("/realtime", realtime_handler().layer(middleware::from_fn(auth)))
        .nest("/wallet", wallet_handler().layer(middleware::from_fn(auth)))
        .nest("/storage", storage_routes)
        .nest("/content", content_handler())
        .nest("/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new().nest("/api", api_route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, db::db::DBClient};
    use axum::{
        body::Body,
        http::{header, Method, Request as HttpRequest, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let config = Config::for_tests();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        create_router(Arc::new(AppState::new(DBClient::new(pool), config)))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn healthcheck_is_public() {
        let response = test_app()
            .oneshot(HttpRequest::get("/api/healthcheck").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cache"], "disabled");
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        for uri in ["/api/users/me", "/api/wallet", "/api/admin/users", "/api/realtime/stream"] {
            let response = test_app()
                .oneshot(HttpRequest::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
            let body = body_json(response).await;
            assert_eq!(body["status"], "fail");
        }
    }

    #[tokio::test]
    async fn garbage_bearer_token_is_rejected() {
        let response = test_app()
            .oneshot(
                HttpRequest::get("/api/bookings")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_validates_before_touching_the_database() {
        let body = json!({
            "name": "A",
            "email": "not-an-email",
            "password": "short",
            "passwordConfirm": "different",
            "role": "customer"
        });

        let response = test_app()
            .oneshot(
                HttpRequest::builder()
                    .method(Method::POST)
                    .uri("/api/auth/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reset_password_validates_before_token_lookup() {
        let body = json!({
            "token": "some-token",
            "new_password": "longenough1",
            "new_password_confirm": "longenough2"
        });

        let response = test_app()
            .oneshot(
                HttpRequest::builder()
                    .method(Method::POST)
                    .uri("/api/auth/reset-password")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-forwarded-for", "10.0.0.9")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["status"], "fail");
    }

    #[tokio::test]
    async fn auth_routes_are_rate_limited() {
        let app = test_app();
        let mut last = StatusCode::OK;

        for _ in 0..11 {
            let response = app
                .clone()
                .oneshot(
                    HttpRequest::builder()
                        .method(Method::POST)
                        .uri("/api/auth/login")
                        .header(header::CONTENT_TYPE, "application/json")
                        .header("x-forwarded-for", "10.0.0.7")
                        .body(Body::from(json!({"email": "", "password": ""}).to_string()))
                        .unwrap(),
                )
                .await
                .unwrap();
            last = response.status();
        }

        assert_eq!(last, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn private_objects_need_a_signature() {
        let response = test_app()
            .oneshot(
                HttpRequest::get(format!("/api/storage/receipts/{}/receipt.pdf", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_bucket_is_a_bad_request() {
        let response = test_app()
            .oneshot(HttpRequest::get("/api/storage/secrets/a/b.png").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
