//! wb-strategy
//!
//! Bidder registry and the strategy wrapper that drives one invocation:
//! parameters -> datasets -> strategy -> validation -> submission.
//!
//! Strategies are pure functions over [`BidInput`]; all IO happens through the
//! [`wb_db::DataSource`] and [`wb_submit::OrderSink`] the caller passes in.

mod bidder;
mod error;
pub mod forecast;
mod input;
mod invocation;
mod registry;
pub mod strategies;

pub use bidder::*;
pub use error::*;
pub use input::*;
pub use invocation::*;
pub use registry::*;

/// Registry with every built-in bidder; `net-power` is the default.
pub fn builtin_registry() -> Result<BidderRegistry, RegistryError> {
    let mut reg = BidderRegistry::new();
    reg.register(strategies::net_power::descriptor())?;
    reg.register(strategies::random::descriptor())?;
    Ok(reg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_register_with_net_power_default() {
        let reg = builtin_registry().unwrap();
        assert_eq!(reg.list(), vec!["net-power", "random"]);
        assert_eq!(reg.default_name(), Some("net-power"));
    }
}
