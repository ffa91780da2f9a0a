pub mod activity_log;
pub mod branch;
pub mod customer;
pub mod notification_template;
pub mod order;
pub mod order_glass;
pub mod order_pricing;
pub mod order_profile;
pub mod user;
