use std::sync::Arc;

use joinwatch_core::{
    PredictionMessage, Scorer, Topic, decode_features,
    events::{EnrichedEvent, EventBus, EventHeader, TopicMessage, expect},
    queues::QueueKind,
    workers::{InputSpec, SubscriptionSpec, Worker},
};
use tracing::{debug, warn};

/// Turns `features` messages into `y_pred` messages with the frozen model.
pub struct ScoreFeaturesWorker {
    scorer: Arc<dyn Scorer>,
}

impl ScoreFeaturesWorker {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self { scorer }
    }
}

impl Worker for ScoreFeaturesWorker {
    const SUBSCRIBER_ID: &'static str = "model.score_features";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![InputSpec {
                event_type: Topic::FEATURES,
                queue_kind: QueueKind::FifoDropOldest { capacity: 64 },
            }],
        }
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, bus: &EventBus) -> anyhow::Result<()> {
        let msg = expect::<TopicMessage>(&event.event, Topic::FEATURES)?;

        let features = match decode_features(&msg.payload) {
            Ok(features) => features,
            Err(e) => {
                warn!(error = %e, "skipping undecodable features");
                return Ok(());
            }
        };

        let y_pred = match self.scorer.predict(&features.features) {
            Ok(y_pred) => y_pred,
            Err(e) => {
                warn!(ts = features.ts, error = %e, "skipping unscorable features");
                return Ok(());
            }
        };

        debug!(ts = features.ts, y_pred, "scored features");

        let prediction = TopicMessage::json(
            EventHeader::child_of(msg.header.event_id),
            Topic::YPred,
            &PredictionMessage {
                ts: features.ts,
                y_pred,
            },
        )?;
        bus.publish(Arc::new(prediction))?;
        Ok(())
    }
}
