//! Price-level aggregation: buckets raw depth into fixed-width, half-open intervals.

pub mod engine;
pub mod step;

pub use engine::{ aggregate, aggregate_with, BucketGrid };
pub use step::AggregationStep;
