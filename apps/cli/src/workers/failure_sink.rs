use std::sync::Arc;

use joinwatch_core::{
    events::{EnrichedEvent, EventBus, expect},
    queues::QueueKind,
    workers::{InputSpec, PipelineFailed, SubscriptionSpec, Worker},
};
use tokio::sync::oneshot;

/// Hands the first stage failure to `main` so the process can exit non-zero.
pub struct FailureSinkWorker {
    done: Option<oneshot::Sender<PipelineFailed>>,
}

impl FailureSinkWorker {
    pub fn new(done: oneshot::Sender<PipelineFailed>) -> Self {
        Self { done: Some(done) }
    }
}

impl Worker for FailureSinkWorker {
    const SUBSCRIBER_ID: &'static str = "cli.failure_sink";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![InputSpec {
                event_type: PipelineFailed::EVENT_TYPE,
                queue_kind: QueueKind::FifoDropOldest { capacity: 4 },
            }],
        }
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, _bus: &EventBus) -> anyhow::Result<()> {
        let failed = expect::<PipelineFailed>(&event.event, PipelineFailed::EVENT_TYPE)?;

        if let Some(done) = self.done.take() {
            // main may already be gone on ctrl-c
            let _ = done.send(failed.clone());
        }
        Ok(())
    }
}
