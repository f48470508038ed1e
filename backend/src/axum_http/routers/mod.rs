pub mod pix_payments;
pub mod subscription_plans;
pub mod subscriptions;
