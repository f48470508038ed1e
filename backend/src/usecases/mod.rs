pub mod billing_errors;
pub mod pix_payments;
pub mod subscription_plans;
pub mod subscriptions;
