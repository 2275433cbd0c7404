//! Services for revenue loading and aggregation

pub mod aggregator;
pub mod loader;

pub use aggregator::{Aggregator, RevenueSources};
pub use loader::RevenueLoader;
