use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crates::{
    domain::{
        entities::pix_payments::{InsertPixPaymentEntity, PixPaymentEntity, PixPaymentStatusChange},
        repositories::{
            RepositoryConflict, pix_payments::PixPaymentRepository, plans::PlanRepository,
            subscriptions::SubscriptionRepository,
        },
        value_objects::{
            enums::pix_payment_statuses::PixPaymentStatus,
            money::AmountMinor,
            pix_payments::{
                CreatePixPaymentModel, PixCharge, PixPaymentDto, UpdatePixPaymentStatusModel,
                pix_payment_expires_at,
            },
            subscriptions::SubscriptionDto,
        },
    },
    payments::pix_client::SandboxPixClient,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    usecases::{
        billing_errors::{BillingError, UseCaseResult},
        subscriptions::plans_by_id,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PixGateway: Send + Sync {
    async fn issue_charge(&self, user_id: Uuid, amount: AmountMinor) -> AnyResult<PixCharge>;

    fn new_transaction_id(&self, at: DateTime<Utc>) -> String;
}

#[async_trait]
impl PixGateway for SandboxPixClient {
    async fn issue_charge(&self, user_id: Uuid, amount: AmountMinor) -> AnyResult<PixCharge> {
        Ok(self.issue_charge(user_id, amount))
    }

    fn new_transaction_id(&self, at: DateTime<Utc>) -> String {
        self.new_transaction_id(at)
    }
}

pub struct PixPaymentUseCase<P, S, Pay, Gateway>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PixPaymentRepository + Send + Sync + 'static,
    Gateway: PixGateway + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    subscription_repo: Arc<S>,
    payment_repo: Arc<Pay>,
    pix_gateway: Arc<Gateway>,
}

impl<P, S, Pay, Gateway> PixPaymentUseCase<P, S, Pay, Gateway>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PixPaymentRepository + Send + Sync + 'static,
    Gateway: PixGateway + Send + Sync + 'static,
{
    pub fn new(
        plan_repo: Arc<P>,
        subscription_repo: Arc<S>,
        payment_repo: Arc<Pay>,
        pix_gateway: Arc<Gateway>,
    ) -> Self {
        Self {
            plan_repo,
            subscription_repo,
            payment_repo,
            pix_gateway,
        }
    }

    /// Idempotent while a charge is live: a pending, unexpired payment for the subscription is
    /// returned as is instead of issuing a new one.
    pub async fn create_pix_payment(
        &self,
        auth: &AuthUser,
        model: CreatePixPaymentModel,
    ) -> UseCaseResult<PixPaymentDto> {
        let user_id = auth.user_id;
        let subscription_id = model.subscription_id;

        let subscription = self
            .subscription_repo
            .find_by_id_for_user(subscription_id, user_id)
            .await
            .map_err(|err| {
                error!(%user_id, %subscription_id, db_error = ?err, "pix_payments: failed to load subscription");
                BillingError::Internal(err)
            })?
            .ok_or(BillingError::NotFound("subscription"))?;

        let amount = AmountMinor::parse(&model.amount).map_err(|err| {
            warn!(%user_id, amount = %model.amount, "pix_payments: invalid amount");
            BillingError::from(err)
        })?;

        let now = Utc::now();
        let existing = self
            .payment_repo
            .find_live_pending_for_subscription(subscription.id, now)
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "pix_payments: failed to load pending payment");
                BillingError::Internal(err)
            })?;
        if let Some(existing) = existing {
            info!(
                %user_id,
                %subscription_id,
                payment_id = %existing.id,
                "pix_payments: reusing live pending payment"
            );
            return Ok(existing.into());
        }

        let charge = self
            .pix_gateway
            .issue_charge(user_id, amount)
            .await
            .map_err(|err| {
                error!(%user_id, %subscription_id, gateway_error = ?err, "pix_payments: failed to issue charge");
                BillingError::Internal(err)
            })?;

        let payment = self
            .payment_repo
            .create_pending_payment(InsertPixPaymentEntity {
                subscription_id: subscription.id,
                user_id,
                amount_minor: amount.minor(),
                status: PixPaymentStatus::Pending.as_str().to_string(),
                expires_at: pix_payment_expires_at(now),
                pix_key: charge.pix_key,
                pix_qr_code: charge.pix_qr_code,
                pix_copy_paste: charge.pix_copy_paste,
                created_at: now,
            })
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "pix_payments: failed to create payment");
                BillingError::Internal(err)
            })?;

        info!(
            %user_id,
            %subscription_id,
            payment_id = %payment.id,
            %amount,
            expires_at = %payment.expires_at,
            "pix_payments: pending payment ready"
        );
        Ok(payment.into())
    }

    /// Provider notification. Terminal payments only accept a redelivery of their own status.
    pub async fn update_pix_payment_status(
        &self,
        auth: &AuthUser,
        model: UpdatePixPaymentStatusModel,
    ) -> UseCaseResult<PixPaymentDto> {
        if !auth.is_admin() {
            warn!(user_id = %auth.user_id, "pix_payments: webhook caller is not the provider");
            return Err(BillingError::Forbidden);
        }

        let payment_id = model.id;
        let payment = self
            .payment_repo
            .find_by_id(payment_id)
            .await
            .map_err(|err| {
                error!(%payment_id, db_error = ?err, "pix_payments: failed to load payment");
                BillingError::Internal(err)
            })?
            .ok_or(BillingError::NotFound("pix payment"))?;

        let current = payment.status();
        if !current.can_transition_to(model.status) {
            warn!(
                %payment_id,
                from = %current,
                to = %model.status,
                "pix_payments: rejected status change on terminal payment"
            );
            return Err(BillingError::InvalidState(format!(
                "payment is {current} and cannot become {}",
                model.status
            )));
        }

        let now = Utc::now();
        let paid_at = match model.status {
            PixPaymentStatus::Paid if current == PixPaymentStatus::Paid => payment.paid_at.or(Some(now)),
            PixPaymentStatus::Paid => Some(now),
            _ => payment.paid_at,
        };

        let target = model.status;
        let change = PixPaymentStatusChange {
            payment_id,
            expected_from: None,
            status: model.status,
            transaction_id: model.transaction_id.or(payment.transaction_id.clone()),
            paid_at,
            activate_subscription: (model.status == PixPaymentStatus::Paid)
                .then_some(payment.subscription_id),
            changed_at: now,
        };

        let updated = self
            .apply_change(change, |stored| {
                BillingError::InvalidState(format!("payment is {stored} and cannot become {target}"))
            })
            .await?;
        info!(
            %payment_id,
            from = %current,
            to = %updated.status,
            subscription_id = %updated.subscription_id,
            "pix_payments: provider status applied"
        );
        Ok(updated.into())
    }

    /// Payer-side confirmation (sandbox flow): pays a live pending payment with a synthetic
    /// transaction id and activates the subscription.
    pub async fn confirm_pix_payment(
        &self,
        auth: &AuthUser,
        payment_id: Uuid,
    ) -> UseCaseResult<PixPaymentDto> {
        let user_id = auth.user_id;

        let payment = self
            .payment_repo
            .find_by_id_for_user(payment_id, user_id)
            .await
            .map_err(|err| {
                error!(%user_id, %payment_id, db_error = ?err, "pix_payments: failed to load payment");
                BillingError::Internal(err)
            })?
            .ok_or(BillingError::NotFound("pix payment"))?;

        if payment.status() != PixPaymentStatus::Pending {
            return Err(confirm_rejection(payment.status()));
        }

        let now = Utc::now();
        if now > payment.expires_at {
            let stored = self
                .payment_repo
                .mark_expired(payment_id, now)
                .await
                .map_err(|err| {
                    error!(%payment_id, db_error = ?err, "pix_payments: failed to expire payment");
                    BillingError::Internal(err)
                })?;
            info!(
                %user_id,
                %payment_id,
                expires_at = %payment.expires_at,
                "pix_payments: confirmation after expiry"
            );
            return match stored.map(|row| row.status()) {
                Some(PixPaymentStatus::Paid) => Err(BillingError::AlreadyPaid),
                _ => Err(BillingError::Expired),
            };
        }

        let transaction_id = self.pix_gateway.new_transaction_id(now);
        let updated = self
            .apply_change(
                PixPaymentStatusChange {
                    payment_id,
                    expected_from: Some(PixPaymentStatus::Pending),
                    status: PixPaymentStatus::Paid,
                    transaction_id: Some(transaction_id),
                    paid_at: Some(now),
                    activate_subscription: Some(payment.subscription_id),
                    changed_at: now,
                },
                confirm_rejection,
            )
            .await?;

        info!(
            %user_id,
            %payment_id,
            subscription_id = %updated.subscription_id,
            "pix_payments: payment confirmed and subscription activated"
        );
        Ok(updated.into())
    }

    pub async fn list_my_payments(&self, auth: &AuthUser) -> UseCaseResult<Vec<PixPaymentDto>> {
        let user_id = auth.user_id;

        let payments = self.payment_repo.list_by_user(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "pix_payments: failed to list payments");
            BillingError::Internal(err)
        })?;
        if payments.is_empty() {
            return Ok(Vec::new());
        }

        let subscriptions = self
            .subscription_repo
            .list_by_user(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "pix_payments: failed to load subscriptions");
                BillingError::Internal(err)
            })?;
        let mut plan_ids: Vec<Uuid> = subscriptions.iter().map(|s| s.plan_id).collect();
        plan_ids.sort();
        plan_ids.dedup();
        let plans = plans_by_id(self.plan_repo.find_by_ids(plan_ids).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "pix_payments: failed to load plans");
            BillingError::Internal(err)
        })?);

        let subscriptions: Vec<SubscriptionDto> = subscriptions
            .into_iter()
            .map(|subscription| {
                let plan = plans.get(&subscription.plan_id).cloned();
                SubscriptionDto::from(subscription).with_plan(plan)
            })
            .collect();

        Ok(payments
            .into_iter()
            .map(|payment| {
                let subscription = subscriptions
                    .iter()
                    .find(|s| s.id == payment.subscription_id)
                    .cloned();
                PixPaymentDto::from(payment).with_subscription(subscription)
            })
            .collect())
    }

    pub async fn get_my_payment(
        &self,
        auth: &AuthUser,
        payment_id: Uuid,
    ) -> UseCaseResult<PixPaymentDto> {
        let user_id = auth.user_id;

        self.payment_repo
            .find_by_id_for_user(payment_id, user_id)
            .await
            .map_err(|err| {
                error!(%user_id, %payment_id, db_error = ?err, "pix_payments: failed to load payment");
                BillingError::Internal(err)
            })?
            .map(PixPaymentDto::from)
            .ok_or(BillingError::NotFound("pix payment"))
    }

    pub async fn get_pending_payment_for_subscription(
        &self,
        auth: &AuthUser,
        subscription_id: Uuid,
    ) -> UseCaseResult<Option<PixPaymentDto>> {
        let user_id = auth.user_id;

        let pending = self
            .payment_repo
            .find_live_pending_for_subscription(subscription_id, Utc::now())
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "pix_payments: failed to load pending payment");
                BillingError::Internal(err)
            })?;

        Ok(pending
            .filter(|payment| payment.user_id == user_id)
            .map(PixPaymentDto::from))
    }

    /// `on_mismatch` turns the stored status into the caller's error when the row moved on
    /// after it was read.
    async fn apply_change(
        &self,
        change: PixPaymentStatusChange,
        on_mismatch: impl Fn(PixPaymentStatus) -> BillingError,
    ) -> UseCaseResult<PixPaymentEntity> {
        let payment_id = change.payment_id;

        self.payment_repo
            .apply_status_change(change)
            .await
            .map_err(|err| {
                if let Some(RepositoryConflict::PaymentStatusMismatch(stored)) =
                    RepositoryConflict::find(&err)
                {
                    warn!(%payment_id, %stored, "pix_payments: payment status changed before the write");
                    return on_mismatch(stored);
                }
                let err = BillingError::from_repository(err);
                match &err {
                    BillingError::Conflict => warn!(
                        %payment_id,
                        "pix_payments: activation blocked by another active subscription"
                    ),
                    other => error!(%payment_id, db_error = ?other, "pix_payments: failed to apply status change"),
                }
                err
            })?
            .ok_or(BillingError::NotFound("pix payment"))
    }
}

fn confirm_rejection(status: PixPaymentStatus) -> BillingError {
    match status {
        PixPaymentStatus::Paid => BillingError::AlreadyPaid,
        PixPaymentStatus::Expired => BillingError::Expired,
        PixPaymentStatus::Cancelled => {
            BillingError::InvalidState("payment has been cancelled".to_string())
        }
        PixPaymentStatus::Pending => {
            BillingError::InvalidState("payment is still pending".to_string())
        }
    }
}
