use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ContentQueryDto {
    pub locale: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpsertContentDto {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 100_000, message = "Body is required"))]
    pub body_html: String,

    #[serde(default)]
    pub published: bool,
}
