// db/contentdb.rs
use async_trait::async_trait;

use super::db::DBClient;
use crate::models::contentmodel::ContentPage;
use crate::utils::locale::Locale;

const CONTENT_COLUMNS: &str = "slug, locale, title, body_html, published, updated_at";

#[async_trait]
pub trait ContentExt {
    async fn get_content_page(&self, slug: &str, locale: Locale) -> Result<Option<ContentPage>, sqlx::Error>;

    async fn get_published_pages(&self, locale: Locale) -> Result<Vec<ContentPage>, sqlx::Error>;

    async fn upsert_content_page(
        &self,
        slug: &str,
        locale: Locale,
        title: &str,
        body_html: &str,
        published: bool,
    ) -> Result<ContentPage, sqlx::Error>;

    async fn delete_content_page(&self, slug: &str, locale: Locale) -> Result<bool, sqlx::Error>;
}

#[async_trait]
impl ContentExt for DBClient {
    async fn get_content_page(&self, slug: &str, locale: Locale) -> Result<Option<ContentPage>, sqlx::Error> {
        sqlx::query_as::<_, ContentPage>(&format!(
            "SELECT {} FROM content_pages WHERE slug = $1 AND locale = $2",
            CONTENT_COLUMNS
        ))
        .bind(slug)
        .bind(locale)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_published_pages(&self, locale: Locale) -> Result<Vec<ContentPage>, sqlx::Error> {
        sqlx::query_as::<_, ContentPage>(&format!(
            "SELECT {} FROM content_pages WHERE locale = $1 AND published ORDER BY slug ASC",
            CONTENT_COLUMNS
        ))
        .bind(locale)
        .fetch_all(&self.pool)
        .await
    }

    async fn upsert_content_page(
        &self,
        slug: &str,
        locale: Locale,
        title: &str,
        body_html: &str,
        published: bool,
    ) -> Result<ContentPage, sqlx::Error> {
        sqlx::query_as::<_, ContentPage>(&format!(
            r#"
            INSERT INTO content_pages (slug, locale, title, body_html, published)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (slug, locale) DO UPDATE
            SET title = EXCLUDED.title,
                body_html = EXCLUDED.body_html,
                published = EXCLUDED.published,
                updated_at = NOW()
            RETURNING {}
            "#,
            CONTENT_COLUMNS
        ))
        .bind(slug)
        .bind(locale)
        .bind(title)
        .bind(body_html)
        .bind(published)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_content_page(&self, slug: &str, locale: Locale) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM content_pages WHERE slug = $1 AND locale = $2")
            .bind(slug)
            .bind(locale)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
