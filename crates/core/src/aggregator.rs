//! The stateful join engine: sole writer of the event log and the error series.

use tracing::{debug, info, warn};

use crate::{
    codec::decode_field,
    config::AggregatorConfig,
    error::{AggregatorError, Result},
    join::{JoinState, JoinTable},
    metric::{EmissionFilter, MetricEngine},
    store::{ErrorSeries, EventLog, StoreSettings},
    types::{FieldEvent, LogPosition, MetricSample, Topic},
};

/// In-memory half of the aggregator. Rebuilt from the event log on startup.
pub struct AggregateState {
    table: JoinTable,
    engine: MetricEngine,
}

impl AggregateState {
    pub fn new(max_pending: Option<usize>) -> Self {
        Self {
            table: JoinTable::with_max_pending(max_pending),
            engine: MetricEngine::new(),
        }
    }

    /// Apply one event to the join table and fold a completed pair into the metric.
    pub fn apply(&mut self, event: &FieldEvent) -> (JoinState, Option<MetricSample>) {
        let state = self.table.apply(event);
        let sample = self.engine.observe(&state, &self.table).map(|value| MetricSample {
            value,
            seq: event.arrival_seq,
        });
        (state, sample)
    }

    pub fn table(&self) -> &JoinTable {
        &self.table
    }

    pub fn engine(&self) -> &MetricEngine {
        &self.engine
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryReport {
    pub events_replayed: usize,
    pub completed_pairs: u64,
    pub pending_keys: usize,
    pub rmse: f64,
    pub series_len: usize,
    /// Pending cap in effect, as recorded for this data dir.
    pub max_pending: Option<usize>,
}

/// Result of one steady-state transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingested {
    pub event: FieldEvent,
    pub position: LogPosition,
    pub state: JoinState,
    pub sample: Option<MetricSample>,
    /// Whether `sample` passed the emission filter and was appended to the series.
    pub emitted: bool,
}

pub struct MetricAggregator {
    state: AggregateState,
    filter: EmissionFilter,
    log: EventLog,
    series: ErrorSeries,
}

impl MetricAggregator {
    /// Open both stores and rebuild in-memory state from the event log.
    /// Nothing is written to the error series during replay.
    pub async fn open(config: &AggregatorConfig) -> Result<(Self, RecoveryReport)> {
        let log = EventLog::open(&config.log_path())
            .await
            .map_err(AggregatorError::EventLog)?;
        let series = ErrorSeries::open(&config.errors_path())
            .await
            .map_err(AggregatorError::ErrorSeries)?;

        let settings = StoreSettings::pin(
            &config.settings_path(),
            StoreSettings {
                max_pending: config.max_pending,
            },
        )
        .await
        .map_err(AggregatorError::EventLog)?;

        let events = log.replay_all().await.map_err(AggregatorError::EventLog)?;
        let mut state = AggregateState::new(settings.max_pending);
        for event in &events {
            state.apply(event);
        }

        let report = RecoveryReport {
            events_replayed: events.len(),
            completed_pairs: state.engine.count(),
            pending_keys: state.table.pending_len(),
            rmse: state.engine.current_value(),
            series_len: series.len(),
            max_pending: settings.max_pending,
        };
        info!(
            events = report.events_replayed,
            pairs = report.completed_pairs,
            pending = report.pending_keys,
            rmse = report.rmse,
            max_pending = ?report.max_pending,
            "recovered aggregator state"
        );

        let aggregator = Self {
            state,
            filter: EmissionFilter::new(series.last()),
            log,
            series,
        };
        Ok((aggregator, report))
    }

    /// Decode, persist, join and (maybe) emit one inbound message.
    ///
    /// A decode failure leaves every store and the in-memory state untouched.
    /// Store failures are fatal to the caller.
    pub async fn ingest(&mut self, topic: Topic, payload: &[u8]) -> Result<Ingested> {
        let decoded = decode_field(topic, payload)?;
        let event = FieldEvent {
            key: decoded.key,
            field: decoded.field,
            value: decoded.value,
            arrival_seq: self.log.next_seq(),
        };

        let position = self
            .log
            .append(&event)
            .await
            .map_err(AggregatorError::EventLog)?;

        let (state, sample) = self.state.apply(&event);

        if let Some(sample) = sample
            && !sample.value.is_finite()
        {
            warn!(key = %event.key, value = sample.value, "metric overflowed, not emitting");
        }

        let mut emitted = false;
        if let Some(sample) = sample
            && self.filter.should_emit(sample.value)
        {
            self.series
                .append(sample.value)
                .await
                .map_err(AggregatorError::ErrorSeries)?;
            self.filter.record(sample.value);
            emitted = true;
        }

        debug!(
            key = %event.key,
            field = event.field.name(),
            seq = position.0,
            complete = state.is_complete(),
            emitted,
            "ingested field event"
        );

        Ok(Ingested {
            event,
            position,
            state,
            sample,
            emitted,
        })
    }

    pub fn current_rmse(&self) -> f64 {
        self.state.engine.current_value()
    }

    pub fn state(&self) -> &AggregateState {
        &self.state
    }

    pub fn series_len(&self) -> usize {
        self.series.len()
    }

    pub fn last_emitted(&self) -> Option<f64> {
        self.filter.last()
    }
}
