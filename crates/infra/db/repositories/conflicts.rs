use diesel::result::{DatabaseErrorKind, Error as DieselError};

pub(crate) const ONE_ACTIVE_SUBSCRIPTION_INDEX: &str = "subscriptions_one_active_per_user";
pub(crate) const ONE_PENDING_PAYMENT_INDEX: &str = "pix_payments_one_pending_per_subscription";

/// True when `err` is a unique violation raised by the named partial index.
pub(crate) fn is_unique_violation_on(err: &anyhow::Error, index: &str) -> bool {
    match err.downcast_ref::<DieselError>() {
        Some(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
            info.constraint_name() == Some(index)
        }
        _ => false,
    }
}
