//! wb-schemas
//!
//! Shared data model for the bidding pipeline:
//! - order rows / order sets as submitted to the auction
//! - the per-day order template skeleton
//! - the loosely-typed `OrderFrame` strategies return, and its validation
//! - invocation parameters and resolved datasets
//!
//! No IO lives here.

mod dataset;
mod frame;
mod order;
mod params;
mod template;
mod validate;

pub use dataset::*;
pub use frame::*;
pub use order::*;
pub use params::*;
pub use template::*;
pub use validate::*;
