use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use joinwatch_core::{
    FeatureMessage, LinearModel, Scorer, Topic, TruthMessage,
    events::{EventBus, EventHeader, TopicMessage},
    workers::PipelineFailed,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio::{sync::broadcast, time::MissedTickBehavior};
use tracing::{debug, error};

use crate::model::FEATURE_DIM;

const FEATURE_RANGE: f64 = 0.1;
const NOISE_RANGE: f64 = 25.0;

/// Source stage: emits a labelled sample every tick, truth first.
pub struct FeatureGenerator {
    rule: LinearModel,
    interval: Duration,
    rng: StdRng,
}

impl FeatureGenerator {
    pub const STAGE: &'static str = "source.generate_features";

    pub fn new(rule: LinearModel, interval: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rule,
            interval,
            rng,
        }
    }

    /// One `(truth, features)` pair sharing a timestamp.
    pub fn sample(&mut self, ts: f64) -> anyhow::Result<(TruthMessage, FeatureMessage)> {
        let features: Vec<f64> = (0..FEATURE_DIM)
            .map(|_| self.rng.gen_range(-FEATURE_RANGE..FEATURE_RANGE))
            .collect();
        let noise = self.rng.gen_range(-NOISE_RANGE..NOISE_RANGE);
        let y_true = self.rule.predict(&features)? + noise;

        Ok((TruthMessage { ts, y_true }, FeatureMessage { ts, features }))
    }

    fn publish_sample(&mut self, bus: &EventBus) -> anyhow::Result<()> {
        let ts = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs_f64();
        let (truth, features) = self.sample(ts)?;

        let header = EventHeader::root();
        let parent = header.event_id;
        bus.publish(Arc::new(TopicMessage::json(header, Topic::YTrue, &truth)?))?;
        bus.publish(Arc::new(TopicMessage::json(
            EventHeader::child_of(parent),
            Topic::Features,
            &features,
        )?))?;

        debug!(ts, y_true = truth.y_true, "published sample");
        Ok(())
    }

    pub async fn run(
        mut self,
        bus: Arc<EventBus>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!(stage = Self::STAGE, "shutting down");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.publish_sample(&bus) {
                        error!(stage = Self::STAGE, error = %e, "generator failed");
                        let failed = PipelineFailed::detached(Self::STAGE, format!("{e:#}"));
                        if let Err(publish_err) = bus.publish(Arc::new(failed)) {
                            error!(stage = Self::STAGE, error = %publish_err, "failure report was not delivered");
                        }
                        return Err(e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::default_model;

    #[test]
    fn sample_shares_the_timestamp_and_stays_near_the_rule() {
        let mut generator = FeatureGenerator::new(default_model(), Duration::from_secs(1), Some(7));
        let (truth, features) = generator.sample(1700000000.25).unwrap();

        assert_eq!(truth.ts, 1700000000.25);
        assert_eq!(features.ts, truth.ts);
        assert_eq!(features.features.len(), FEATURE_DIM);
        assert!(features.features.iter().all(|x| x.abs() <= FEATURE_RANGE));

        let clean = default_model().predict(&features.features).unwrap();
        assert!((truth.y_true - clean).abs() <= NOISE_RANGE);
    }

    #[test]
    fn seeded_generators_repeat() {
        let mut a = FeatureGenerator::new(default_model(), Duration::from_secs(1), Some(3));
        let mut b = FeatureGenerator::new(default_model(), Duration::from_secs(1), Some(3));
        assert_eq!(a.sample(1.0).unwrap().1.features, b.sample(1.0).unwrap().1.features);
    }
}
