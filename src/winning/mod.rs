pub mod closing;
pub mod model;
pub mod noshow;
pub mod payment;
