use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::walletmodels::{RequestStatus, Wallet};
use crate::utils::{currency::format_amount, locale::Locale};

use super::commondtos::FileUploadDto;

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletResponseDto {
    pub wallet: Wallet,
    pub held_amount: i64,
    pub balance_display: String,
    pub available_display: String,
}

impl WalletResponseDto {
    pub fn from_wallet(wallet: Wallet, locale: Locale) -> Self {
        WalletResponseDto {
            held_amount: wallet.held_amount(),
            balance_display: format_amount(wallet.balance, locale),
            available_display: format_amount(wallet.available_balance, locale),
            wallet,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateTopupDto {
    #[validate(range(min = 100, max = 100_000_000, message = "Top-up must be between 1 MAD and 1,000,000 MAD"))]
    pub amount: i64,

    #[validate]
    pub receipt: FileUploadDto,
}

fn validate_iban(iban: &str) -> Result<(), validator::ValidationError> {
    let compact: String = iban.chars().filter(|c| !c.is_whitespace()).collect();
    let well_formed = (15..=34).contains(&compact.len())
        && compact.chars().take(2).all(|c| c.is_ascii_alphabetic())
        && compact.chars().all(|c| c.is_ascii_alphanumeric());

    if well_formed {
        Ok(())
    } else {
        let mut error = validator::ValidationError::new("invalid_iban");
        error.message = Some("IBAN is invalid".into());
        Err(error)
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateRefundRequestDto {
    #[validate(range(min = 100, message = "Refund must be at least 1 MAD"))]
    pub amount: i64,

    #[validate(length(min = 2, max = 100, message = "Bank name is required"))]
    pub bank_name: String,

    #[validate(length(min = 2, max = 100, message = "Account holder is required"))]
    pub account_holder: String,

    #[validate(custom = "validate_iban")]
    pub iban: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewRequestDto {
    pub approved: bool,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct RequestStatusQueryDto {
    pub status: Option<RequestStatus>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iban_shape() {
        assert!(validate_iban("MA64 0111 1100 0001 2300 0000 0000").is_ok());
        assert!(validate_iban("1234").is_err());
        assert!(validate_iban("MA64-0111").is_err());
    }

    #[test]
    fn refund_minimum() {
        let dto = CreateRefundRequestDto {
            amount: 50,
            bank_name: "CIH".to_string(),
            account_holder: "Amina".to_string(),
            iban: "MA640111110000012300000000".to_string(),
        };
        assert!(dto.validate().is_err());
    }
}
