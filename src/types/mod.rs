//! Type definitions for revdash

mod error;
mod records;
mod revenue;

pub use error::*;
pub use records::*;
pub use revenue::*;
