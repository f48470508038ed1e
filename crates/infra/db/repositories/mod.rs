mod conflicts;
pub mod pix_payments;
pub mod plans;
pub mod subscriptions;
