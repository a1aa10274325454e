pub mod metric_emitted;

pub use metric_emitted::*;
