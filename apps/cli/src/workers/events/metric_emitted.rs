use std::time::SystemTime;

use joinwatch_core::{
    CorrelationKey, MetricSample,
    events::{Event, EventHeader},
};
use uuid::Uuid;

/// A new RMSE value made it into the error series.
#[derive(Clone, serde::Serialize)]
pub struct MetricEmitted {
    pub header: EventHeader,
    pub key: CorrelationKey,
    pub sample: MetricSample,
    pub pairs: u64,
}

impl MetricEmitted {
    pub const EVENT_TYPE: &'static str = "metric.emitted";

    pub fn new(
        parent_event_id: Uuid,
        key: CorrelationKey,
        sample: MetricSample,
        pairs: u64,
    ) -> Self {
        Self {
            header: EventHeader::child_of(parent_event_id),
            key,
            sample,
            pairs,
        }
    }
}

impl Event for MetricEmitted {
    fn event_id(&self) -> Uuid {
        self.header.event_id
    }

    fn parent_ids(&self) -> &[Uuid] {
        &self.header.parent_ids
    }

    fn event_type(&self) -> &'static str {
        Self::EVENT_TYPE
    }

    fn timestamp(&self) -> SystemTime {
        self.header.timestamp
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self as &dyn std::any::Any
    }
}
