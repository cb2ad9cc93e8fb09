use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::HeaderMap,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};

use crate::{
    db::contentdb::ContentExt,
    dtos::{commondtos::ApiResponse, contentdtos::ContentQueryDto},
    error::HttpError,
    handler::auth::request_locale,
    utils::locale::Locale,
    AppState,
};

pub fn content_handler() -> Router {
    Router::new()
        .route("/", get(list_pages))
        .route("/:slug", get(get_page))
}

/// An explicit `?locale=` wins over `Accept-Language`.
fn resolve_locale(query: &ContentQueryDto, headers: &HeaderMap) -> Locale {
    query
        .locale
        .as_deref()
        .and_then(Locale::try_parse)
        .unwrap_or_else(|| request_locale(headers))
}

pub async fn get_page(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<ContentQueryDto>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let locale = resolve_locale(&query, &headers);

    let mut page = app_state.db_client
        .get_content_page(&slug, locale)
        .await?
        .filter(|page| page.published);

    if page.is_none() && locale != Locale::En {
        page = app_state.db_client
            .get_content_page(&slug, Locale::En)
            .await?
            .filter(|page| page.published);
    }

    let page = page.ok_or_else(|| HttpError::not_found("Page not found"))?;

    Ok(Json(ApiResponse::success("Page retrieved", page)))
}

pub async fn list_pages(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<ContentQueryDto>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let locale = resolve_locale(&query, &headers);
    let pages = app_state.db_client.get_published_pages(locale).await?;

    Ok(Json(ApiResponse::success("Pages retrieved", pages)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    fn headers(accept_language: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_str(accept_language).unwrap());
        headers
    }

    #[test]
    fn query_locale_beats_header() {
        let query = ContentQueryDto { locale: Some("ar".to_string()) };
        assert_eq!(resolve_locale(&query, &headers("de-DE,de;q=0.9")), Locale::Ar);
    }

    #[test]
    fn header_used_when_query_missing_or_unknown() {
        let query = ContentQueryDto::default();
        assert_eq!(resolve_locale(&query, &headers("fr-MA,fr;q=0.9,en;q=0.5")), Locale::Fr);

        let query = ContentQueryDto { locale: Some("zz".to_string()) };
        assert_eq!(resolve_locale(&query, &headers("de")), Locale::De);
    }

    #[test]
    fn english_by_default() {
        assert_eq!(resolve_locale(&ContentQueryDto::default(), &HeaderMap::new()), Locale::En);
    }
}
