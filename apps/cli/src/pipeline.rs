use std::{sync::Arc, time::Duration};

use joinwatch_core::{
    MetricAggregator, Scorer,
    events::{BusConfig, EventBus, EventBusBuilder},
    workers::{PipelineFailed, Worker},
};
use tokio::{
    sync::{broadcast, oneshot},
    task::JoinSet,
};
use tracing::{debug, info};

use crate::{
    model::default_model,
    workers::{
        aggregate_metric::AggregateMetricWorker, failure_sink::FailureSinkWorker,
        generate_features::FeatureGenerator, report_metric::ReportMetricWorker,
        score_features::ScoreFeaturesWorker,
    },
};

pub struct PipelineSettings {
    pub bus: BusConfig,
    pub interval: Duration,
    pub seed: Option<u64>,
}

pub struct PipelineHandle {
    pub bus: Arc<EventBus>,
    pub shutdown_tx: broadcast::Sender<()>,
    pub failed_rx: oneshot::Receiver<PipelineFailed>,
    pub tasks: JoinSet<anyhow::Result<()>>,
}

impl PipelineHandle {
    /// Signal every stage and wait for them to stop.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(());
        debug!(
            unrouted = self.bus.metrics().unrouted_total(),
            scorer_drops = self.bus.drops_for(ScoreFeaturesWorker::SUBSCRIBER_ID),
            report_drops = self.bus.drops_for(ReportMetricWorker::SUBSCRIBER_ID),
            "bus counters at shutdown"
        );
        while let Some(joined) = self.tasks.join_next().await {
            if let Ok(Err(e)) = joined {
                debug!(error = %e, "stage exited with error");
            }
        }
    }
}

pub fn start_pipeline(
    settings: PipelineSettings,
    aggregator: MetricAggregator,
    scorer: Arc<dyn Scorer>,
) -> anyhow::Result<PipelineHandle> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let (failed_tx, failed_rx) = oneshot::channel::<PipelineFailed>();

    let (bus, mut wiring, startup) = EventBusBuilder::new(settings.bus)
        .subscribe(ScoreFeaturesWorker::subscription())
        .subscribe(AggregateMetricWorker::subscription())
        .subscribe(ReportMetricWorker::subscription())
        .subscribe(FailureSinkWorker::subscription())
        .build()?;
    let bus = Arc::new(bus);

    // isolated drain tasks must run before the source publishes anything
    for t in startup.tokio {
        tokio::spawn(t);
    }

    let mut tasks = JoinSet::new();
    tasks.spawn(ScoreFeaturesWorker::new(scorer).run(
        wiring.take(ScoreFeaturesWorker::SUBSCRIBER_ID)?,
        Arc::clone(&bus),
        shutdown_rx.resubscribe(),
    ));
    tasks.spawn(AggregateMetricWorker::new(aggregator).run(
        wiring.take(AggregateMetricWorker::SUBSCRIBER_ID)?,
        Arc::clone(&bus),
        shutdown_rx.resubscribe(),
    ));
    tasks.spawn(ReportMetricWorker.run(
        wiring.take(ReportMetricWorker::SUBSCRIBER_ID)?,
        Arc::clone(&bus),
        shutdown_rx.resubscribe(),
    ));
    tasks.spawn(FailureSinkWorker::new(failed_tx).run(
        wiring.take(FailureSinkWorker::SUBSCRIBER_ID)?,
        Arc::clone(&bus),
        shutdown_rx.resubscribe(),
    ));

    let generator = FeatureGenerator::new(default_model(), settings.interval, settings.seed);
    tasks.spawn(generator.run(Arc::clone(&bus), shutdown_rx));

    info!(
        session = %bus.session_id(),
        interval_ms = settings.interval.as_millis() as u64,
        "pipeline started"
    );

    Ok(PipelineHandle {
        bus,
        shutdown_tx,
        failed_rx,
        tasks,
    })
}
