use std::sync::Arc;

use console::style;
use joinwatch_core::{
    events::{EnrichedEvent, EventBus, expect},
    queues::QueueKind,
    workers::{InputSpec, SubscriptionSpec, Worker},
};

use crate::workers::events::MetricEmitted;

/// Prints each emitted RMSE. Slow terminals only back up this worker's own inbox.
pub struct ReportMetricWorker;

impl Worker for ReportMetricWorker {
    const SUBSCRIBER_ID: &'static str = "cli.report_metric";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![InputSpec {
                event_type: MetricEmitted::EVENT_TYPE,
                queue_kind: QueueKind::Isolated { output_buffer: 16 },
            }],
        }
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, _bus: &EventBus) -> anyhow::Result<()> {
        let emitted = expect::<MetricEmitted>(&event.event, MetricEmitted::EVENT_TYPE)?;

        println!(
            "{} {} {}",
            style("Current RMSE:").dim(),
            style(format!("{:.4}", emitted.sample.value)).cyan().bold(),
            style(format!("[pairs={} ts={}]", emitted.pairs, emitted.key)).dim()
        );
        Ok(())
    }
}
