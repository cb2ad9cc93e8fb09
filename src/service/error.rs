use thiserror::Error;

use crate::{
    error::HttpError,
    models::bookingmodel::TransitionError,
    service::storage::StorageError,
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("{0}")]
    InvalidTransition(TransitionError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<TransitionError> for ServiceError {
    fn from(error: TransitionError) -> Self {
        ServiceError::InvalidTransition(error)
    }
}

impl From<String> for ServiceError {
    fn from(err: String) -> Self {
        ServiceError::Other(err)
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::NotFound(message) => HttpError::not_found(message),
            ServiceError::Forbidden(message) => HttpError::forbidden(message),
            ServiceError::Conflict(message) => HttpError::conflict(message),
            ServiceError::InsufficientFunds { .. } => HttpError::payment_required(error.to_string()),
            ServiceError::InvalidTransition(ref transition) => match transition {
                TransitionError::Invalid { .. } => HttpError::bad_request(error.to_string()),
                TransitionError::NotAllowed { .. } => HttpError::forbidden(error.to_string()),
            },
            ServiceError::Validation(message) => HttpError::bad_request(message),
            ServiceError::Storage(storage) => storage.into(),
            ServiceError::Database(db) => db.into(),
            ServiceError::Other(message) => {
                tracing::error!("Service error: {}", message);
                HttpError::server_error(crate::error::ErrorMessage::ServerError.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bookingmodel::{BookingActor, BookingStatus};
    use axum::http::StatusCode;

    #[test]
    fn status_mapping() {
        let cases: Vec<(ServiceError, StatusCode)> = vec![
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                ServiceError::InsufficientFunds { required: 10, available: 5 },
                StatusCode::PAYMENT_REQUIRED,
            ),
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Database(sqlx::Error::RowNotFound), StatusCode::NOT_FOUND),
            (ServiceError::Other("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            let http: HttpError = error.into();
            assert_eq!(http.status, status);
        }
    }

    #[test]
    fn transition_errors_split_between_400_and_403() {
        let invalid: HttpError = ServiceError::from(TransitionError::Invalid {
            from: BookingStatus::Completed,
            to: BookingStatus::Pending,
        })
        .into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

        let not_allowed: HttpError = ServiceError::from(TransitionError::NotAllowed {
            actor: BookingActor::Customer,
            to: BookingStatus::Accepted,
        })
        .into();
        assert_eq!(not_allowed.status, StatusCode::FORBIDDEN);
    }
}
