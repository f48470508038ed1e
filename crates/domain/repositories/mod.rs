pub mod pix_payments;
pub mod plans;
pub mod subscriptions;

use thiserror::Error;

use crate::domain::value_objects::enums::pix_payment_statuses::PixPaymentStatus;

/// Write rejected because it would break a uniqueness rule of the billing tables, or because
/// the row changed status after the caller read it.
/// Carried inside `anyhow::Error`; callers recover it with `downcast_ref`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RepositoryConflict {
    #[error("user already has an active subscription")]
    ActiveSubscriptionExists,
    #[error("subscription already has a pending pix payment")]
    PendingPaymentExists,
    #[error("pix payment is {0} and cannot take this status change")]
    PaymentStatusMismatch(PixPaymentStatus),
}

impl RepositoryConflict {
    pub fn find(err: &anyhow::Error) -> Option<Self> {
        err.downcast_ref::<RepositoryConflict>().copied()
    }
}
