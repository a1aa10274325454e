use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use anyhow::Result;
use tokio::sync::Notify;
use tracing::debug;
use uuid::Uuid;

use crate::{
    events::{EnrichedEvent, EventBus},
    queues::{FifoDropOldestQueue, IsolatedForwarder, QueueKind, StartupTasks, UnboundedQueue},
    routes::{Route, RouteInbox, Routes},
    workers::{FifoInput, FifoReceiver, SubscriptionSpec, WorkerInputs, WorkerWiring},
};

pub struct BusConfig {
    pub session_id: Uuid,
    pub strict_routing: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            strict_routing: false,
        }
    }
}

pub struct BusMetrics {
    pub unrouted_publish_total: AtomicU64,
}

impl BusMetrics {
    pub fn new() -> Self {
        Self {
            unrouted_publish_total: AtomicU64::new(0),
        }
    }

    pub fn record_unrouted(&self, evt: &'static str) {
        self.unrouted_publish_total.fetch_add(1, Ordering::Relaxed);
        debug!(event_type = evt, "no route for published event");
    }

    pub fn unrouted_total(&self) -> u64 {
        self.unrouted_publish_total.load(Ordering::Relaxed)
    }
}

impl Default for BusMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(subs: &[SubscriptionSpec]) -> Result<()> {
    use std::collections::HashSet;

    let mut seen_subscribers: HashSet<&'static str> = HashSet::new();
    for s in subs {
        if s.subscriber_id.trim().is_empty() {
            anyhow::bail!("empty subscriber_id");
        }
        if !seen_subscribers.insert(s.subscriber_id) {
            anyhow::bail!("duplicate subscriber_id={}", s.subscriber_id);
        }
        if s.inputs.is_empty() {
            anyhow::bail!("subscriber_id={} has no inputs", s.subscriber_id);
        }

        let mut seen_inputs: HashSet<&'static str> = HashSet::new();
        for i in &s.inputs {
            if i.event_type.trim().is_empty() {
                anyhow::bail!("subscriber_id={} has empty event_type", s.subscriber_id);
            }
            if !seen_inputs.insert(i.event_type) {
                anyhow::bail!(
                    "subscriber_id={} has duplicate input event_type={}",
                    s.subscriber_id,
                    i.event_type
                );
            }

            match i.queue_kind {
                QueueKind::Unbounded => {}
                QueueKind::FifoDropOldest { capacity } => {
                    anyhow::ensure!(capacity > 0, "capacity must be > 0")
                }
                QueueKind::Isolated { output_buffer } => {
                    anyhow::ensure!(output_buffer > 0, "output_buffer must be > 0")
                }
            }
        }
    }
    Ok(())
}

pub struct EventBusBuilder {
    cfg: BusConfig,
    subs: Vec<SubscriptionSpec>,
}

impl EventBusBuilder {
    pub fn new(cfg: BusConfig) -> Self {
        Self {
            cfg,
            subs: Vec::new(),
        }
    }

    pub fn subscribe(mut self, s: SubscriptionSpec) -> Self {
        self.subs.push(s);
        self
    }

    pub fn build(self) -> Result<(EventBus, WorkerWiring, StartupTasks)> {
        validate(&self.subs)?;

        let mut routes: HashMap<&'static str, Vec<Route>> = HashMap::new();
        let mut wiring: HashMap<&'static str, WorkerInputs> = HashMap::new();
        let mut tasks = StartupTasks { tokio: Vec::new() };
        let metrics = Arc::new(BusMetrics::new());

        for spec in self.subs {
            let notify_any = Arc::new(Notify::new());
            let mut fifos = Vec::new();

            for input in spec.inputs {
                let drops_total = Arc::new(AtomicU64::new(0));

                let inbox = match input.queue_kind {
                    QueueKind::Unbounded => {
                        let q = Arc::new(UnboundedQueue::new(Arc::clone(&notify_any)));
                        fifos.push(FifoInput {
                            event_type: input.event_type,
                            receiver: FifoReceiver::Unbounded(q.receiver()),
                        });
                        RouteInbox::Unbounded(q)
                    }
                    QueueKind::FifoDropOldest { capacity } => {
                        let q =
                            Arc::new(FifoDropOldestQueue::new(capacity, Arc::clone(&notify_any)));
                        fifos.push(FifoInput {
                            event_type: input.event_type,
                            receiver: FifoReceiver::FifoDropOldest(q.receiver()),
                        });
                        RouteInbox::FifoDropOldest(q)
                    }
                    QueueKind::Isolated { output_buffer } => {
                        let (fwd, out_rx, drain_task) =
                            IsolatedForwarder::<Arc<EnrichedEvent>>::new(
                                output_buffer,
                                Arc::clone(&notify_any),
                            );
                        tasks.tokio.push(drain_task);
                        fifos.push(FifoInput {
                            event_type: input.event_type,
                            receiver: FifoReceiver::Isolated(out_rx),
                        });
                        RouteInbox::Isolated(fwd)
                    }
                };

                routes.entry(input.event_type).or_default().push(Route {
                    subscriber_id: spec.subscriber_id,
                    inbox,
                    drops_total,
                });
            }

            wiring.insert(
                spec.subscriber_id,
                WorkerInputs {
                    fifos,
                    notify_any,
                    fifo_index: 0,
                },
            );
        }

        let bus = EventBus::new(self.cfg, Routes { table: routes }, metrics);
        Ok((bus, WorkerWiring::new(wiring), tasks))
    }
}
