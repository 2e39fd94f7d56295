pub mod trade;

// Re-export models for easy access
pub use trade::{AggregatedData, Trade};
