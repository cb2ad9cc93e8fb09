use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SignUrlDto {
    #[validate(length(min = 1))]
    pub bucket: String,
    #[validate(length(min = 1, max = 512))]
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignedUrlDto {
    pub url: String,
    pub expires_at: i64,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct SignedObjectQuery {
    pub expires: Option<i64>,
    pub signature: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadedFileDto {
    pub bucket: String,
    pub path: String,
}
