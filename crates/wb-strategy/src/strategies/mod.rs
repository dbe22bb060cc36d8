//! Built-in bidders.

pub mod net_power;
pub mod random;
