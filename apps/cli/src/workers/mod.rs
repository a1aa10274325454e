pub mod aggregate_metric;
pub mod events;
pub mod failure_sink;
pub mod generate_features;
pub mod report_metric;
pub mod score_features;
