//! Infrastructure layer: record sources
//!
//! This layer implements the data-fetch boundary trait.

pub mod error;
pub mod traits;

pub use error::{InfraError, InfraResult};
pub use traits::{JsonFileSource, RecordSource, StaticSource};
