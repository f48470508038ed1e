pub mod enums;
pub mod money;
pub mod pix_payments;
pub mod plans;
pub mod subscriptions;
