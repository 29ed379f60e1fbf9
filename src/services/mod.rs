// Services module - Business logic

pub mod coupon_lifecycle;
