// Domain layer: billing models and ports (interfaces) to the student/payment/book stores.

pub mod model;
pub mod ports;
