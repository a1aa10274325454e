//! Joinwatch Core Library
//!
//! Joins a prediction stream with a ground-truth stream by correlation key,
//! tracks the running RMSE of completed pairs and persists enough to recover
//! after a restart. Also hosts the in-process event bus and worker runtime the
//! pipeline stages run on.

pub mod aggregator;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod join;
pub mod metric;
pub mod queues;
pub mod routes;
pub mod scorer;
pub mod store;
pub mod types;
pub mod workers;

// Re-export commonly used items at crate root
pub use aggregator::{AggregateState, Ingested, MetricAggregator, RecoveryReport};
pub use codec::{FeatureMessage, PredictionMessage, TruthMessage, decode_features, decode_field};
pub use config::{AggregatorConfig, get_root_data_dir};
pub use error::{AggregatorError, DecodeError, ModelError, Result, StoreError, TransportError};
pub use join::{JoinEntry, JoinState, JoinTable};
pub use metric::{EmissionFilter, MetricEngine};
pub use scorer::{LinearModel, Scorer};
pub use store::{ErrorSeries, EventLog, StoreSettings};
pub use types::{CorrelationKey, Field, FieldEvent, LogPosition, MetricSample, Topic};
