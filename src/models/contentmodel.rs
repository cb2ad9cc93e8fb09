use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::locale::Locale;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContentPage {
    pub slug: String,
    pub locale: Locale,
    pub title: String,
    pub body_html: String,
    pub published: bool,
    pub updated_at: DateTime<Utc>,
}
