pub mod classifier;
pub mod engine;
pub mod inspect;
pub mod parser;
pub mod pipeline;
pub mod registry;
pub mod sample;
pub mod sink;
pub mod summary;

pub use crate::domain::model::{
    Bucket, ClassificationEvent, EdgePolicy, IntervalCounters, Record, TimeRange,
};
pub use crate::domain::ports::{ConfigProvider, Storage};
pub use crate::utils::error::Result;
