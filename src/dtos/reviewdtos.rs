use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateReviewDto {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(max = 1000, message = "Comment must not exceed 1000 characters"))]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        assert!(CreateReviewDto { rating: 5, comment: None }.validate().is_ok());
        assert!(CreateReviewDto { rating: 0, comment: None }.validate().is_err());
        assert!(CreateReviewDto { rating: 6, comment: None }.validate().is_err());
        assert!(CreateReviewDto { rating: 3, comment: Some("x".repeat(1001)) }.validate().is_err());
    }
}
