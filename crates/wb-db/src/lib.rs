//! wb-db
//!
//! Query Resolver: binds invocation parameters into query templates and
//! executes them against a [`DataSource`], returning named, time-ordered
//! datasets.

mod error;
mod fixture;
mod pg;
mod source;
mod template;

pub use error::*;
pub use fixture::*;
pub use pg::*;
pub use source::*;
pub use template::*;
