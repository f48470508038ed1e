use axum::http::StatusCode;
use crates::domain::{repositories::RepositoryConflict, value_objects::money::InvalidAmount};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("user already has an active subscription")]
    Conflict,
    #[error("{0}")]
    InvalidState(String),
    #[error("subscription is already cancelled")]
    AlreadyCancelled,
    #[error("payment has already been paid")]
    AlreadyPaid,
    #[error("payment has expired")]
    Expired,
    #[error("{0}")]
    InvalidInput(String),
    #[error("administrator role required")]
    Forbidden,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BillingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BillingError::NotFound(_) => StatusCode::NOT_FOUND,
            BillingError::Conflict | BillingError::AlreadyCancelled | BillingError::AlreadyPaid => {
                StatusCode::CONFLICT
            }
            BillingError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BillingError::Expired => StatusCode::GONE,
            BillingError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            BillingError::Forbidden => StatusCode::FORBIDDEN,
            BillingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Repository failures become `Conflict` when they carry an active-subscription conflict.
    pub fn from_repository(err: anyhow::Error) -> Self {
        match RepositoryConflict::find(&err) {
            Some(RepositoryConflict::ActiveSubscriptionExists) => BillingError::Conflict,
            Some(RepositoryConflict::PaymentStatusMismatch(stored)) => {
                BillingError::InvalidState(format!("payment is {stored}"))
            }
            _ => BillingError::Internal(err),
        }
    }
}

impl From<InvalidAmount> for BillingError {
    fn from(err: InvalidAmount) -> Self {
        BillingError::InvalidInput(err.to_string())
    }
}

pub type UseCaseResult<T> = std::result::Result<T, BillingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(BillingError::NotFound("plan").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(BillingError::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(BillingError::AlreadyCancelled.status_code(), StatusCode::CONFLICT);
        assert_eq!(BillingError::AlreadyPaid.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            BillingError::InvalidState("plan is inactive".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(BillingError::Expired.status_code(), StatusCode::GONE);
        assert_eq!(
            BillingError::InvalidInput("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(BillingError::Forbidden.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn repository_conflict_maps_to_conflict() {
        let err = anyhow::Error::from(RepositoryConflict::ActiveSubscriptionExists);
        assert!(matches!(BillingError::from_repository(err), BillingError::Conflict));

        let err = anyhow::Error::from(RepositoryConflict::PaymentStatusMismatch(
            crates::domain::value_objects::enums::pix_payment_statuses::PixPaymentStatus::Expired,
        ));
        assert!(matches!(
            BillingError::from_repository(err),
            BillingError::InvalidState(message) if message == "payment is expired"
        ));

        let err = anyhow::anyhow!("connection reset");
        assert!(matches!(BillingError::from_repository(err), BillingError::Internal(_)));
    }
}
