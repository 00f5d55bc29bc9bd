//! catree: certificate-authority hierarchy resolver
//!
//! Rebuilds a forest of CA records from flat input, isolates orphans whose
//! parent cannot be determined, and provides the filter, sort, flatten and
//! pagination transforms a display layer runs over the result.
//!
//! Layers:
//! - `domain`: records, resolver and transforms (no I/O)
//! - `application`: the display pipeline service
//! - `infrastructure`: record sources
//! - `cli`: command line front end

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
