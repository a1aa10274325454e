use std::sync::Arc;

use joinwatch_core::{
    MetricAggregator, Topic,
    events::{EnrichedEvent, EventBus, TopicMessage, expect},
    queues::QueueKind,
    workers::{InputSpec, SubscriptionSpec, Worker},
};
use tracing::{debug, warn};

use crate::workers::events::MetricEmitted;

/// Sole owner of the aggregator. Both label topics are drained by this one
/// worker loop, so every decode/log/join/emit transition runs to completion
/// before the next message is looked at.
pub struct AggregateMetricWorker {
    aggregator: MetricAggregator,
}

impl AggregateMetricWorker {
    pub fn new(aggregator: MetricAggregator) -> Self {
        Self { aggregator }
    }
}

impl Worker for AggregateMetricWorker {
    const SUBSCRIBER_ID: &'static str = "metric.aggregate";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![
                InputSpec {
                    event_type: Topic::Y_TRUE,
                    queue_kind: QueueKind::Unbounded,
                },
                InputSpec {
                    event_type: Topic::Y_PRED,
                    queue_kind: QueueKind::Unbounded,
                },
            ],
        }
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, bus: &EventBus) -> anyhow::Result<()> {
        let msg = expect::<TopicMessage>(&event.event, event.event.event_type())?;

        let ingested = match self.aggregator.ingest(msg.topic, &msg.payload).await {
            Ok(ingested) => ingested,
            Err(e) if !e.is_fatal() => {
                warn!(topic = msg.topic.name(), error = %e, "dropping message");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(sample) = ingested.sample {
            debug!(
                key = %ingested.event.key,
                rmse = sample.value,
                emitted = ingested.emitted,
                "pair joined"
            );
        }

        if ingested.emitted
            && let Some(sample) = ingested.sample
        {
            bus.publish(Arc::new(MetricEmitted::new(
                msg.header.event_id,
                ingested.event.key,
                sample,
                self.aggregator.state().engine().count(),
            )))?;
        }

        Ok(())
    }
}
