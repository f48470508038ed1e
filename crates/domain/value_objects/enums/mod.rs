pub mod pix_payment_statuses;
pub mod plan_intervals;
pub mod subscription_statuses;
