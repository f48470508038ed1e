pub mod expire_billing;
