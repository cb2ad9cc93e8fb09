//1
use chrono::prelude::*;
use serde::{Deserialize, Serialize};

use crate::utils::locale::Locale;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    Tasker,
    Admin,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Tasker => "tasker",
            UserRole::Admin => "admin",
        }
    }
}

/// What a row's `verification_token` was issued for.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "token_purpose", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    EmailVerification,
    PasswordReset,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub role: UserRole,
    pub locale: Locale,
    pub bio: Option<String>,
    pub avatar_path: Option<String>,
    pub verified: bool,
    pub is_suspended: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_token: Option<String>,

    pub token_expires_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing)]
    pub token_purpose: Option<TokenPurpose>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// A stored token only redeems for the flow it was issued for, and only
    /// until it expires.
    pub fn token_valid_for(&self, purpose: TokenPurpose, now: DateTime<Utc>) -> bool {
        self.verification_token.is_some()
            && self.token_purpose == Some(purpose)
            && self.token_expires_at.map(|expires_at| now <= expires_at).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_token(purpose: TokenPurpose, expires_in: chrono::Duration) -> User {
        let now = Utc::now();
        User {
            id: uuid::Uuid::new_v4(),
            name: "Yassine".to_string(),
            email: "yassine@example.com".to_string(),
            phone: None,
            password: "hash".to_string(),
            role: UserRole::Customer,
            locale: Locale::En,
            bio: None,
            avatar_path: None,
            verified: false,
            is_suspended: false,
            verification_token: Some("token".to_string()),
            token_expires_at: Some(now + expires_in),
            token_purpose: Some(purpose),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn verification_token_cannot_reset_password() {
        let user = user_with_token(TokenPurpose::EmailVerification, chrono::Duration::hours(24));
        assert!(user.token_valid_for(TokenPurpose::EmailVerification, Utc::now()));
        assert!(!user.token_valid_for(TokenPurpose::PasswordReset, Utc::now()));
    }

    #[test]
    fn reset_token_cannot_verify_email() {
        let user = user_with_token(TokenPurpose::PasswordReset, chrono::Duration::minutes(30));
        assert!(user.token_valid_for(TokenPurpose::PasswordReset, Utc::now()));
        assert!(!user.token_valid_for(TokenPurpose::EmailVerification, Utc::now()));
    }

    #[test]
    fn expired_or_missing_tokens_are_refused() {
        let user = user_with_token(TokenPurpose::PasswordReset, chrono::Duration::minutes(-1));
        assert!(!user.token_valid_for(TokenPurpose::PasswordReset, Utc::now()));

        let mut user = user_with_token(TokenPurpose::PasswordReset, chrono::Duration::minutes(30));
        user.token_purpose = None;
        assert!(!user.token_valid_for(TokenPurpose::PasswordReset, Utc::now()));
    }
}
