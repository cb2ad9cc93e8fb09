use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::HttpError;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;

//Response wrappers
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub status: String,
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }

    pub fn message_only(message: &str) -> ApiResponse<()> {
        ApiResponse {
            status: "success".to_string(),
            message: message.to_string(),
            data: None,
        }
    }
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, page: u32, limit: u32) -> Self {
        let total_pages = ((total as f64) / (limit.max(1) as f64)).ceil() as u32;
        Self {
            status: "success".to_string(),
            data,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct PageQueryDto {
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 50, message = "Limit must be between 1 and 50"))]
    pub limit: Option<u32>,
}

impl PageQueryDto {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, 50)
    }

    pub fn offset(&self) -> i64 {
        ((self.page() - 1) * self.limit()) as i64
    }
}

/// A file sent inline as base64 inside a JSON body.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct FileUploadDto {
    #[validate(length(min = 1, max = 255, message = "File name must be between 1 and 255 characters"))]
    pub file_name: String,

    #[validate(length(min = 1, message = "Content type is required"))]
    pub content_type: String,

    #[validate(length(min = 1, message = "File data is required"))]
    pub data_base64: String,
}

impl FileUploadDto {
    pub fn decode(&self) -> Result<Vec<u8>, HttpError> {
        // Accept data URLs as produced by browsers' FileReader.
        let raw = match self.data_base64.split_once(";base64,") {
            Some((_, data)) => data,
            None => self.data_base64.as_str(),
        };

        STANDARD
            .decode(raw.trim())
            .map_err(|_| HttpError::bad_request("File data is not valid base64"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_offset() {
        let query = PageQueryDto::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(query.offset(), 0);

        let query = PageQueryDto { page: Some(3), limit: Some(10) };
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn page_limits_are_validated() {
        assert!(PageQueryDto { page: Some(0), limit: None }.validate().is_err());
        assert!(PageQueryDto { page: None, limit: Some(51) }.validate().is_err());
        assert!(PageQueryDto { page: Some(2), limit: Some(50) }.validate().is_ok());
    }

    #[test]
    fn paginated_response_counts_pages() {
        let response = PaginatedResponse::new(vec![1, 2, 3], 41, 1, 20);
        assert_eq!(response.total_pages, 3);
    }

    #[test]
    fn upload_decodes_plain_and_data_url() {
        let plain = FileUploadDto {
            file_name: "a.png".to_string(),
            content_type: "image/png".to_string(),
            data_base64: "aGVsbG8=".to_string(),
        };
        assert_eq!(plain.decode().unwrap(), b"hello");

        let data_url = FileUploadDto {
            data_base64: "data:image/png;base64,aGVsbG8=".to_string(),
            ..plain.clone()
        };
        assert_eq!(data_url.decode().unwrap(), b"hello");

        let broken = FileUploadDto {
            data_base64: "***".to_string(),
            ..plain
        };
        assert!(broken.decode().is_err());
    }
}
