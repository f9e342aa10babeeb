pub mod context;
pub mod dedup;
pub mod etl;
pub mod existing;
pub mod format;
pub mod ledger;
pub mod pipeline;
pub mod sink;
pub mod transform;

pub use crate::domain::model::{Format, Key, Record, TransformResult};
pub use crate::domain::ports::{Pipeline, TabularStore};
pub use crate::utils::error::Result;
