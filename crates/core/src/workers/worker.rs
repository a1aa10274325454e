use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{debug, error};

use crate::{
    events::{EnrichedEvent, EventBus},
    workers::{PipelineFailed, SubscriptionSpec, WorkerInputs},
};

/// A pipeline stage. All of a worker's inputs are handled one at a time by `run`,
/// so `handle` has exclusive access to the worker's state.
pub trait Worker: Send + Sized + 'static {
    const SUBSCRIBER_ID: &'static str;
    fn subscription() -> SubscriptionSpec;

    /// Recoverable problems are dealt with inside `handle`; an `Err` stops the stage.
    async fn handle(&mut self, event: Arc<EnrichedEvent>, bus: &EventBus) -> Result<()>;

    async fn run(
        mut self,
        mut inputs: WorkerInputs,
        bus: Arc<EventBus>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<()> {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!(worker = Self::SUBSCRIBER_ID, "shutting down");
                    return Ok(());
                }
                item = inputs.next() => {
                    let parent = Arc::clone(&item.event);
                    if let Err(e) = self.handle(item.event, &bus).await {
                        error!(worker = Self::SUBSCRIBER_ID, event_type = item.event_type, error = %e, "stage failed");
                        let failed = PipelineFailed::new(Arc::clone(&parent.event), Self::SUBSCRIBER_ID, format!("{e:#}"));
                        if let Err(publish_err) = bus.publish(Arc::new(failed)) {
                            error!(worker = Self::SUBSCRIBER_ID, error = %publish_err, "failure report was not delivered");
                        }
                        return Err(e);
                    }
                }
            }
        }
    }
}
