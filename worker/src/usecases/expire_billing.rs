use anyhow::Result;
use chrono::{DateTime, Utc};
use crates::domain::repositories::{
    pix_payments::PixPaymentRepository, subscriptions::SubscriptionRepository,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpireBillingResult {
    pub expired_payments: usize,
    pub expired_subscriptions: usize,
    /// Repositories that failed during this run; the others still ran.
    pub failures: Vec<String>,
}

/// Marks lapsed pending payments and lapsed active subscriptions as expired.
pub struct ExpireBillingUseCase {
    payment_repository: Arc<dyn PixPaymentRepository + Send + Sync>,
    subscription_repository: Arc<dyn SubscriptionRepository + Send + Sync>,
}

impl ExpireBillingUseCase {
    pub fn new(
        payment_repository: Arc<dyn PixPaymentRepository + Send + Sync>,
        subscription_repository: Arc<dyn SubscriptionRepository + Send + Sync>,
    ) -> Self {
        Self {
            payment_repository,
            subscription_repository,
        }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<ExpireBillingResult> {
        let mut result = ExpireBillingResult::default();

        match self.payment_repository.expire_lapsed_payments(now).await {
            Ok(count) => result.expired_payments = count,
            Err(err) => {
                error!(db_error = ?err, "expire_billing: failed to expire pix payments");
                result.failures.push(format!("pix_payments: {err}"));
            }
        }

        match self
            .subscription_repository
            .expire_lapsed_subscriptions(now)
            .await
        {
            Ok(count) => result.expired_subscriptions = count,
            Err(err) => {
                error!(db_error = ?err, "expire_billing: failed to expire subscriptions");
                result.failures.push(format!("subscriptions: {err}"));
            }
        }

        if result.failures.len() == 2 {
            anyhow::bail!("expire_billing: every repository failed: {:?}", result.failures);
        }

        info!(
            expired_payments = result.expired_payments,
            expired_subscriptions = result.expired_subscriptions,
            failures = result.failures.len(),
            "expire_billing: sweep finished"
        );
        Ok(result)
    }
}
