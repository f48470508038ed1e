use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use crates::domain::{
    entities::{
        pix_payments::PixPaymentEntity, plans::PlanEntity,
        subscriptions::InsertSubscriptionEntity,
    },
    repositories::{
        pix_payments::PixPaymentRepository, plans::PlanRepository,
        subscriptions::SubscriptionRepository,
    },
    value_objects::{
        enums::subscription_statuses::SubscriptionStatus,
        pix_payments::PixPaymentDto,
        plans::PlanDto,
        subscriptions::{CreateSubscriptionModel, SubscriptionDto},
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    usecases::billing_errors::{BillingError, UseCaseResult},
};

/// Payments embedded per subscription in the "my subscriptions" listing.
pub const RECENT_PAYMENTS_PER_SUBSCRIPTION: usize = 5;

pub(crate) fn plans_by_id(plans: Vec<PlanEntity>) -> HashMap<Uuid, PlanDto> {
    plans
        .into_iter()
        .map(|plan| (plan.id, PlanDto::from(plan)))
        .collect()
}

fn payments_by_subscription(payments: Vec<PixPaymentEntity>) -> HashMap<Uuid, Vec<PixPaymentDto>> {
    let mut grouped: HashMap<Uuid, Vec<PixPaymentDto>> = HashMap::new();
    for payment in payments {
        grouped
            .entry(payment.subscription_id)
            .or_default()
            .push(payment.into());
    }
    grouped
}

pub struct SubscriptionUseCase<P, S, Pay>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PixPaymentRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    subscription_repo: Arc<S>,
    payment_repo: Arc<Pay>,
}

impl<P, S, Pay> SubscriptionUseCase<P, S, Pay>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PixPaymentRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>, subscription_repo: Arc<S>, payment_repo: Arc<Pay>) -> Self {
        Self {
            plan_repo,
            subscription_repo,
            payment_repo,
        }
    }

    /// Creates a pending subscription. Activation happens only through a paid PIX payment.
    pub async fn create_subscription(
        &self,
        auth: &AuthUser,
        model: CreateSubscriptionModel,
    ) -> UseCaseResult<SubscriptionDto> {
        let user_id = auth.user_id;
        let plan_id = model.plan_id;
        let now = Utc::now();
        info!(%user_id, %plan_id, "subscriptions: create requested");

        let current = self
            .subscription_repo
            .find_current_active_subscription(user_id, now)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to load active subscription");
                BillingError::Internal(err)
            })?;
        if let Some(current) = current {
            warn!(
                %user_id,
                subscription_id = %current.id,
                "subscriptions: user already has an active subscription"
            );
            return Err(BillingError::Conflict);
        }

        let plan = self
            .plan_repo
            .find_active_plan_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "subscriptions: failed to load plan");
                BillingError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%user_id, %plan_id, "subscriptions: plan missing or inactive");
                BillingError::InvalidState("plan does not exist or is inactive".to_string())
            })?;

        let end_date = plan.interval.period_end(now).ok_or_else(|| {
            BillingError::Internal(anyhow::anyhow!(
                "subscription end date overflows for interval {}",
                plan.interval
            ))
        })?;

        let subscription = self
            .subscription_repo
            .create_pending_subscription(
                InsertSubscriptionEntity {
                    user_id,
                    plan_id,
                    status: SubscriptionStatus::Pending.as_str().to_string(),
                    start_date: now,
                    end_date: Some(end_date),
                },
                now,
            )
            .await
            .map_err(|err| {
                let err = BillingError::from_repository(err);
                if let BillingError::Internal(inner) = &err {
                    error!(%user_id, db_error = ?inner, "subscriptions: failed to create subscription");
                } else {
                    warn!(%user_id, "subscriptions: concurrent activation won the race");
                }
                err
            })?;

        info!(
            %user_id,
            subscription_id = %subscription.id,
            %end_date,
            "subscriptions: pending subscription created"
        );
        Ok(SubscriptionDto::from(subscription).with_plan(Some(plan.into())))
    }

    /// Pending, active and expired subscriptions can be cancelled; the first cancellation
    /// timestamp is kept.
    pub async fn cancel_subscription(
        &self,
        auth: &AuthUser,
        subscription_id: Uuid,
    ) -> UseCaseResult<SubscriptionDto> {
        let user_id = auth.user_id;

        let subscription = self
            .subscription_repo
            .find_by_id_for_user(subscription_id, user_id)
            .await
            .map_err(|err| {
                error!(%user_id, %subscription_id, db_error = ?err, "subscriptions: failed to load subscription");
                BillingError::Internal(err)
            })?
            .ok_or(BillingError::NotFound("subscription"))?;

        if subscription.status() == SubscriptionStatus::Cancelled {
            info!(%user_id, %subscription_id, "subscriptions: already cancelled");
            return Err(BillingError::AlreadyCancelled);
        }

        let cancelled = self
            .subscription_repo
            .cancel_subscription(subscription_id, Utc::now())
            .await
            .map_err(|err| {
                error!(%user_id, %subscription_id, db_error = ?err, "subscriptions: failed to cancel subscription");
                BillingError::Internal(err)
            })?
            .ok_or(BillingError::AlreadyCancelled)?;

        info!(
            %user_id,
            %subscription_id,
            previous_status = %subscription.status(),
            "subscriptions: subscription cancelled"
        );
        Ok(cancelled.into())
    }

    pub async fn list_my_subscriptions(&self, auth: &AuthUser) -> UseCaseResult<Vec<SubscriptionDto>> {
        let user_id = auth.user_id;

        let subscriptions = self
            .subscription_repo
            .list_by_user(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to list subscriptions");
                BillingError::Internal(err)
            })?;
        if subscriptions.is_empty() {
            return Ok(Vec::new());
        }

        let mut plan_ids: Vec<Uuid> = subscriptions.iter().map(|s| s.plan_id).collect();
        plan_ids.sort();
        plan_ids.dedup();
        let subscription_ids = subscriptions.iter().map(|s| s.id).collect();

        let plans = plans_by_id(self.plan_repo.find_by_ids(plan_ids).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "subscriptions: failed to load plans");
            BillingError::Internal(err)
        })?);
        let mut payments = payments_by_subscription(
            self.payment_repo
                .list_by_subscriptions(subscription_ids, Some(RECENT_PAYMENTS_PER_SUBSCRIPTION))
                .await
                .map_err(|err| {
                    error!(%user_id, db_error = ?err, "subscriptions: failed to load payments");
                    BillingError::Internal(err)
                })?,
        );

        Ok(subscriptions
            .into_iter()
            .map(|subscription| {
                let plan = plans.get(&subscription.plan_id).cloned();
                let recent = payments.remove(&subscription.id).unwrap_or_default();
                SubscriptionDto::from(subscription)
                    .with_plan(plan)
                    .with_payments(recent)
            })
            .collect())
    }

    pub async fn get_my_active_subscription(
        &self,
        auth: &AuthUser,
    ) -> UseCaseResult<Option<SubscriptionDto>> {
        let user_id = auth.user_id;

        let Some(subscription) = self
            .subscription_repo
            .find_current_active_subscription(user_id, Utc::now())
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to load active subscription");
                BillingError::Internal(err)
            })?
        else {
            info!(%user_id, "subscriptions: no active subscription");
            return Ok(None);
        };

        let plan = self.load_plan(subscription.plan_id).await?;
        Ok(Some(SubscriptionDto::from(subscription).with_plan(plan)))
    }

    pub async fn get_my_subscription(
        &self,
        auth: &AuthUser,
        subscription_id: Uuid,
    ) -> UseCaseResult<SubscriptionDto> {
        let user_id = auth.user_id;

        let subscription = self
            .subscription_repo
            .find_by_id_for_user(subscription_id, user_id)
            .await
            .map_err(|err| {
                error!(%user_id, %subscription_id, db_error = ?err, "subscriptions: failed to load subscription");
                BillingError::Internal(err)
            })?
            .ok_or(BillingError::NotFound("subscription"))?;

        let plan = self.load_plan(subscription.plan_id).await?;
        let payments = self
            .payment_repo
            .list_by_subscriptions(vec![subscription_id], None)
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "subscriptions: failed to load payments");
                BillingError::Internal(err)
            })?;

        Ok(SubscriptionDto::from(subscription)
            .with_plan(plan)
            .with_payments(payments.into_iter().map(PixPaymentDto::from).collect()))
    }

    async fn load_plan(&self, plan_id: Uuid) -> UseCaseResult<Option<PlanDto>> {
        let plan = self.plan_repo.find_by_id(plan_id).await.map_err(|err| {
            error!(%plan_id, db_error = ?err, "subscriptions: failed to load plan");
            BillingError::Internal(err)
        })?;
        Ok(plan.map(PlanDto::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Months};
    use crates::domain::{
        entities::subscriptions::SubscriptionEntity,
        repositories::{
            RepositoryConflict, pix_payments::MockPixPaymentRepository,
            plans::MockPlanRepository, subscriptions::MockSubscriptionRepository,
        },
        value_objects::{enums::plan_intervals::PlanInterval, money::AmountMinor},
    };
    use mockall::predicate::{always, eq};

    fn member(user_id: Uuid) -> AuthUser {
        AuthUser {
            user_id,
            email: Some("member@example.com".to_string()),
            role: "authenticated".to_string(),
        }
    }

    fn sample_plan(id: Uuid, interval: PlanInterval) -> PlanEntity {
        let now = Utc::now();
        PlanEntity {
            id,
            name: "Plano Pro".to_string(),
            description: None,
            price: AmountMinor::from_minor(7990),
            interval,
            features: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_subscription(user_id: Uuid, plan_id: Uuid, status: SubscriptionStatus) -> SubscriptionEntity {
        let now = Utc::now();
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id,
            plan_id,
            status: status.as_str().to_string(),
            start_date: now,
            end_date: Some(now + Duration::days(30)),
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_payment(subscription_id: Uuid, user_id: Uuid) -> PixPaymentEntity {
        let now = Utc::now();
        PixPaymentEntity {
            id: Uuid::new_v4(),
            subscription_id,
            user_id,
            amount_minor: 7990,
            status: "pending".to_string(),
            expires_at: now + Duration::minutes(30),
            pix_key: "pix@example.com".to_string(),
            pix_qr_code: "000201".to_string(),
            pix_copy_paste: "000201ABCD".to_string(),
            transaction_id: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn usecase(
        plan_repo: MockPlanRepository,
        subscription_repo: MockSubscriptionRepository,
        payment_repo: MockPixPaymentRepository,
    ) -> SubscriptionUseCase<MockPlanRepository, MockSubscriptionRepository, MockPixPaymentRepository>
    {
        SubscriptionUseCase::new(
            Arc::new(plan_repo),
            Arc::new(subscription_repo),
            Arc::new(payment_repo),
        )
    }

    fn months_between(start: DateTime<Utc>, end: DateTime<Utc>, months: u32) -> bool {
        start.checked_add_months(Months::new(months)) == Some(end)
    }

    #[tokio::test]
    async fn create_subscription_is_pending_with_interval_end_date() {
        for (interval, months) in [
            (PlanInterval::Monthly, 1),
            (PlanInterval::Quarterly, 3),
            (PlanInterval::Yearly, 12),
        ] {
            let user_id = Uuid::new_v4();
            let plan_id = Uuid::new_v4();
            let plan = sample_plan(plan_id, interval);

            let mut plan_repo = MockPlanRepository::new();
            let mut subscription_repo = MockSubscriptionRepository::new();
            let mut payment_repo = MockPixPaymentRepository::new();

            subscription_repo
                .expect_find_current_active_subscription()
                .with(eq(user_id), always())
                .returning(|_, _| Ok(None));
            plan_repo
                .expect_find_active_plan_by_id()
                .with(eq(plan_id))
                .returning(move |_| Ok(Some(plan.clone())));
            subscription_repo
                .expect_create_pending_subscription()
                .withf(move |insert, now| {
                    insert.user_id == user_id
                        && insert.plan_id == plan_id
                        && insert.status == "pending"
                        && insert.start_date == *now
                        && insert
                            .end_date
                            .is_some_and(|end| months_between(insert.start_date, end, months))
                })
                .times(1)
                .returning(|insert, now| {
                    Ok(SubscriptionEntity {
                        id: Uuid::new_v4(),
                        user_id: insert.user_id,
                        plan_id: insert.plan_id,
                        status: insert.status,
                        start_date: insert.start_date,
                        end_date: insert.end_date,
                        cancelled_at: None,
                        created_at: now,
                        updated_at: now,
                    })
                });
            payment_repo.expect_create_pending_payment().never();

            let created = usecase(plan_repo, subscription_repo, payment_repo)
                .create_subscription(&member(user_id), CreateSubscriptionModel { plan_id })
                .await
                .unwrap();

            assert_eq!(created.status, SubscriptionStatus::Pending);
            assert_eq!(created.plan.map(|p| p.id), Some(plan_id));
        }
    }

    #[tokio::test]
    async fn create_subscription_conflicts_with_current_active() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let active = sample_subscription(user_id, plan_id, SubscriptionStatus::Active);

        let plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_current_active_subscription()
            .returning(move |_, _| Ok(Some(active.clone())));
        subscription_repo.expect_create_pending_subscription().never();

        let result = usecase(plan_repo, subscription_repo, MockPixPaymentRepository::new())
            .create_subscription(&member(user_id), CreateSubscriptionModel { plan_id })
            .await;

        assert!(matches!(result, Err(BillingError::Conflict)));
    }

    #[tokio::test]
    async fn create_subscription_rejects_inactive_plan() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();

        let mut plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_current_active_subscription()
            .returning(|_, _| Ok(None));
        plan_repo
            .expect_find_active_plan_by_id()
            .with(eq(plan_id))
            .returning(|_| Ok(None));
        subscription_repo.expect_create_pending_subscription().never();

        let result = usecase(plan_repo, subscription_repo, MockPixPaymentRepository::new())
            .create_subscription(&member(user_id), CreateSubscriptionModel { plan_id })
            .await;

        assert!(matches!(result, Err(BillingError::InvalidState(_))));
    }

    #[tokio::test]
    async fn create_subscription_maps_storage_conflict() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let plan = sample_plan(plan_id, PlanInterval::Monthly);

        let mut plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_current_active_subscription()
            .returning(|_, _| Ok(None));
        plan_repo
            .expect_find_active_plan_by_id()
            .returning(move |_| Ok(Some(plan.clone())));
        subscription_repo
            .expect_create_pending_subscription()
            .returning(|_, _| Err(RepositoryConflict::ActiveSubscriptionExists.into()));

        let result = usecase(plan_repo, subscription_repo, MockPixPaymentRepository::new())
            .create_subscription(&member(user_id), CreateSubscriptionModel { plan_id })
            .await;

        assert!(matches!(result, Err(BillingError::Conflict)));
    }

    #[tokio::test]
    async fn cancel_unknown_subscription_is_not_found() {
        let user_id = Uuid::new_v4();
        let subscription_id = Uuid::new_v4();

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_id_for_user()
            .with(eq(subscription_id), eq(user_id))
            .returning(|_, _| Ok(None));
        subscription_repo.expect_cancel_subscription().never();

        let result = usecase(
            MockPlanRepository::new(),
            subscription_repo,
            MockPixPaymentRepository::new(),
        )
        .cancel_subscription(&member(user_id), subscription_id)
        .await;

        assert!(matches!(result, Err(BillingError::NotFound("subscription"))));
    }

    #[tokio::test]
    async fn cancel_twice_keeps_first_cancelled_at() {
        let user_id = Uuid::new_v4();
        let first_cancel = Utc::now() - Duration::hours(2);
        let mut cancelled =
            sample_subscription(user_id, Uuid::new_v4(), SubscriptionStatus::Cancelled);
        cancelled.cancelled_at = Some(first_cancel);
        let subscription_id = cancelled.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_id_for_user()
            .returning(move |_, _| Ok(Some(cancelled.clone())));
        subscription_repo.expect_cancel_subscription().never();

        let result = usecase(
            MockPlanRepository::new(),
            subscription_repo,
            MockPixPaymentRepository::new(),
        )
        .cancel_subscription(&member(user_id), subscription_id)
        .await;

        assert!(matches!(result, Err(BillingError::AlreadyCancelled)));
    }

    #[tokio::test]
    async fn cancel_accepts_pending_active_and_expired() {
        for status in [
            SubscriptionStatus::Pending,
            SubscriptionStatus::Active,
            SubscriptionStatus::Expired,
        ] {
            let user_id = Uuid::new_v4();
            let subscription = sample_subscription(user_id, Uuid::new_v4(), status);
            let subscription_id = subscription.id;
            let stored = subscription.clone();

            let mut subscription_repo = MockSubscriptionRepository::new();
            subscription_repo
                .expect_find_by_id_for_user()
                .returning(move |_, _| Ok(Some(stored.clone())));
            subscription_repo
                .expect_cancel_subscription()
                .with(eq(subscription_id), always())
                .times(1)
                .returning(move |_, cancelled_at| {
                    let mut row = subscription.clone();
                    row.status = "cancelled".to_string();
                    row.cancelled_at = Some(cancelled_at);
                    Ok(Some(row))
                });

            let cancelled = usecase(
                MockPlanRepository::new(),
                subscription_repo,
                MockPixPaymentRepository::new(),
            )
            .cancel_subscription(&member(user_id), subscription_id)
            .await
            .unwrap();

            assert_eq!(cancelled.status, SubscriptionStatus::Cancelled);
            assert!(cancelled.cancelled_at.is_some());
        }
    }

    #[tokio::test]
    async fn concurrent_cancel_reports_already_cancelled() {
        let user_id = Uuid::new_v4();
        let subscription = sample_subscription(user_id, Uuid::new_v4(), SubscriptionStatus::Active);
        let subscription_id = subscription.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_id_for_user()
            .returning(move |_, _| Ok(Some(subscription.clone())));
        subscription_repo
            .expect_cancel_subscription()
            .returning(|_, _| Ok(None));

        let result = usecase(
            MockPlanRepository::new(),
            subscription_repo,
            MockPixPaymentRepository::new(),
        )
        .cancel_subscription(&member(user_id), subscription_id)
        .await;

        assert!(matches!(result, Err(BillingError::AlreadyCancelled)));
    }

    #[tokio::test]
    async fn list_embeds_plan_and_recent_payments() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let plan = sample_plan(plan_id, PlanInterval::Monthly);
        let subscription = sample_subscription(user_id, plan_id, SubscriptionStatus::Pending);
        let subscription_id = subscription.id;
        let payment = sample_payment(subscription_id, user_id);

        let mut plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut payment_repo = MockPixPaymentRepository::new();
        subscription_repo
            .expect_list_by_user()
            .with(eq(user_id))
            .returning(move |_| Ok(vec![subscription.clone()]));
        plan_repo
            .expect_find_by_ids()
            .with(eq(vec![plan_id]))
            .returning(move |_| Ok(vec![plan.clone()]));
        payment_repo
            .expect_list_by_subscriptions()
            .with(eq(vec![subscription_id]), eq(Some(RECENT_PAYMENTS_PER_SUBSCRIPTION)))
            .returning(move |_, _| Ok(vec![payment.clone()]));

        let listed = usecase(plan_repo, subscription_repo, payment_repo)
            .list_my_subscriptions(&member(user_id))
            .await
            .unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].plan.as_ref().map(|p| p.id), Some(plan_id));
        assert_eq!(listed[0].pix_payments.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn active_subscription_is_none_without_current_row() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_current_active_subscription()
            .returning(|_, _| Ok(None));

        let active = usecase(
            MockPlanRepository::new(),
            subscription_repo,
            MockPixPaymentRepository::new(),
        )
        .get_my_active_subscription(&member(user_id))
        .await
        .unwrap();

        assert!(active.is_none());
    }

    #[tokio::test]
    async fn foreign_subscription_is_not_found() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_id_for_user()
            .returning(|_, _| Ok(None));

        let result = usecase(
            MockPlanRepository::new(),
            subscription_repo,
            MockPixPaymentRepository::new(),
        )
        .get_my_subscription(&member(user_id), Uuid::new_v4())
        .await;

        assert!(matches!(result, Err(BillingError::NotFound(_))));
    }
}
