//! Application layer: services and use cases
//!
//! This layer runs the display pipeline over domain transforms and depends on
//! the record source boundary trait.

pub mod error;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
