use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{addressmodel::Address, usermodel::*};
use crate::utils::locale::Locale;

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let phone_regex = regex::Regex::new(r"^\+?[0-9]{9,15}$")
        .map_err(|_| ValidationError::new("Invalid phone regex"))?;

    if !phone_regex.is_match(phone) {
        let mut error = ValidationError::new("invalid_phone");
        error.message = Some(Cow::from("Phone number must be 9 to 15 digits, optionally starting with +"));
        return Err(error);
    }
    Ok(())
}

fn validate_signup_role(role: &UserRole) -> Result<(), ValidationError> {
    match role {
        UserRole::Customer | UserRole::Tasker => Ok(()),
        UserRole::Admin => {
            let mut error = ValidationError::new("invalid_role");
            error.message = Some("Admin role cannot be chosen at registration".into());
            Err(error)
        }
    }
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,

    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,

    #[validate(
        length(min = 1, message = "Confirm Password is required"),
        must_match(other = "password", message = "passwords do not match")
    )]
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: String,

    #[validate(custom = "validate_signup_role")]
    pub role: UserRole,

    pub locale: Option<Locale>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Email is required"), email(message = "Email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FilterUserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub locale: Locale,
    pub bio: Option<String>,
    pub avatar_path: Option<String>,
    pub verified: bool,
    pub is_suspended: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            name: user.name.to_owned(),
            email: user.email.to_owned(),
            phone: user.phone.clone(),
            role: user.role.to_str().to_string(),
            locale: user.locale,
            bio: user.bio.clone(),
            avatar_path: user.avatar_path.clone(),
            verified: user.verified,
            is_suspended: user.is_suspended,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn filter_users(user: &[User]) -> Vec<FilterUserDto> {
        user.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub token: String,
    pub user: FilterUserDto,
}

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateProfileDto {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: Option<String>,

    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,

    #[validate(length(max = 1000, message = "Bio must not exceed 1000 characters"))]
    pub bio: Option<String>,

    pub locale: Option<Locale>,
}

#[derive(Debug, Validate, Default, Clone, Serialize, Deserialize)]
pub struct UserPasswordUpdateDto {
    #[validate(length(min = 8, max = 128, message = "New password must be between 8 and 128 characters"))]
    pub new_password: String,

    #[validate(
        length(min = 1, message = "New password confirm is required."),
        must_match(other = "new_password", message = "new passwords do not match")
    )]
    pub new_password_confirm: String,

    #[validate(length(min = 1, message = "Old password is required."))]
    pub old_password: String,
}

#[derive(Serialize, Deserialize, Validate)]
pub struct VerifyEmailQueryDto {
    #[validate(length(min = 1, message = "Token is required."))]
    pub token: String,
}

#[derive(Deserialize, Serialize, Validate, Debug, Clone)]
pub struct ForgotPasswordRequestDto {
    #[validate(length(min = 1, message = "Email is required"), email(message = "Email is invalid"))]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct ResetPasswordRequestDto {
    #[validate(length(min = 1, message = "Token is required."))]
    pub token: String,

    #[validate(length(min = 8, max = 128, message = "New password must be between 8 and 128 characters"))]
    pub new_password: String,

    #[validate(
        length(min = 1, message = "New password confirm is required."),
        must_match(other = "new_password", message = "new passwords do not match")
    )]
    pub new_password_confirm: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct AddressDto {
    #[validate(length(min = 1, max = 50, message = "Label must be between 1 and 50 characters"))]
    pub label: String,

    #[validate(length(min = 3, max = 255, message = "Street must be between 3 and 255 characters"))]
    pub street: String,

    #[validate(length(min = 2, max = 100, message = "City must be between 2 and 100 characters"))]
    pub city: String,

    #[validate(length(max = 100, message = "Region must not exceed 100 characters"))]
    pub region: Option<String>,

    #[validate(length(max = 20, message = "Postal code must not exceed 20 characters"))]
    pub postal_code: Option<String>,

    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddressListDto {
    pub addresses: Vec<Address>,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct BecomeTaskerDto {
    #[validate(length(min = 10, max = 1000, message = "Bio must be between 10 and 1000 characters"))]
    pub bio: String,

    #[validate(range(min = 0, max = 60, message = "Experience must be between 0 and 60 years"))]
    pub experience_years: i32,

    #[validate(length(min = 1, max = 10, message = "Provide between 1 and 10 service cities"))]
    pub service_cities: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct AdminUserQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<u32>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuspendUserDto {
    pub suspended: bool,
}

/// The part of a user that other users may see.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PublicUserDto {
    pub id: Uuid,
    pub name: String,
    pub avatar_path: Option<String>,
    pub role: String,
}

impl PublicUserDto {
    pub fn from_user(user: &User) -> Self {
        PublicUserDto {
            id: user.id,
            name: user.name.clone(),
            avatar_path: user.avatar_path.clone(),
            role: user.role.to_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(role: UserRole) -> RegisterUserDto {
        RegisterUserDto {
            name: "Amina Idrissi".to_string(),
            email: "amina@example.com".to_string(),
            phone: Some("+212600000000".to_string()),
            password: "password123".to_string(),
            password_confirm: "password123".to_string(),
            role,
            locale: Some(Locale::Fr),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(register(UserRole::Customer).validate().is_ok());
        assert!(register(UserRole::Tasker).validate().is_ok());
    }

    #[test]
    fn admin_cannot_self_register() {
        assert!(register(UserRole::Admin).validate().is_err());
    }

    #[test]
    fn phone_format_is_enforced() {
        assert!(validate_phone("0612345678").is_ok());
        assert!(validate_phone("+212612345678").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("06-12-34-56-78").is_err());

        let mut dto = register(UserRole::Customer);
        dto.phone = Some("abc".to_string());
        assert!(dto.validate().is_err());
        dto.phone = None;
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn password_rules() {
        let mut dto = register(UserRole::Customer);
        dto.password = "short".to_string();
        dto.password_confirm = "short".to_string();
        assert!(dto.validate().is_err());

        let mut dto = register(UserRole::Customer);
        dto.password_confirm = "different123".to_string();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn register_body_uses_camel_case_confirmation() {
        let body = serde_json::json!({
            "name": "Karim",
            "email": "karim@example.com",
            "password": "password123",
            "passwordConfirm": "password123",
            "role": "tasker"
        });
        let dto: RegisterUserDto = serde_json::from_value(body).unwrap();
        assert_eq!(dto.role, UserRole::Tasker);
        assert!(dto.locale.is_none());
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn profile_bio_limit() {
        let dto = UpdateProfileDto {
            bio: Some("x".repeat(1001)),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }
}
