use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorMessage, HttpError};

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}

pub fn create_token(
    user_id: &str,
    secret: &[u8],
    expires_in_minutes: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    if user_id.is_empty() {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidSubject.into());
    }

    let now = Utc::now();
    let iat = now.timestamp() as usize;
    let exp = (now + Duration::minutes(expires_in_minutes)).timestamp() as usize;
    let claims = TokenClaims {
        sub: user_id.to_string(),
        iat,
        exp,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
}

pub fn decode_claims<T: Into<String>>(token: T, secret: &[u8]) -> Result<TokenClaims, HttpError> {
    let decoded = decode::<TokenClaims>(
        &token.into(),
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    );

    match decoded {
        Ok(token) => Ok(token.claims),
        Err(_) => Err(HttpError::unauthorized(ErrorMessage::InvalidToken.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_subject() {
        let token = create_token("user-123", b"secret", 10).unwrap();
        assert_eq!(decode_claims(token, b"secret").unwrap().sub, "user-123");
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = create_token("user-123", b"secret", 10).unwrap();
        let err = decode_claims(token, b"other").unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn rejects_expired_token() {
        // jsonwebtoken allows 60s of leeway by default
        let token = create_token("user-123", b"secret", -5).unwrap();
        assert!(decode_claims(token, b"secret").is_err());
    }

    #[test]
    fn each_token_gets_its_own_id() {
        let first = decode_claims(create_token("user-123", b"secret", 10).unwrap(), b"secret").unwrap();
        let second = decode_claims(create_token("user-123", b"secret", 10).unwrap(), b"secret").unwrap();
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn refuses_empty_subject() {
        assert!(create_token("", b"secret", 10).is_err());
    }
}
