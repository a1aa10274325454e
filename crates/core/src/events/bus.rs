use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::time::Instant;
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::TransportError,
    events::{BusConfig, BusMetrics, EnrichedEvent, Event, EventHeader, TopicMessage},
    routes::Routes,
    types::Topic,
};

/// In-process topic channel. Every subscriber of an event type gets its own copy.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

pub struct EventBusInner {
    session_id: Uuid,
    next_ingest_seq: AtomicU64,
    routes: Arc<Routes>,
    metrics: Arc<BusMetrics>,
    strict_routing: bool,
}

impl EventBus {
    pub fn new(cfg: BusConfig, routes: Routes, metrics: Arc<BusMetrics>) -> Self {
        Self {
            inner: Arc::new(EventBusInner {
                session_id: cfg.session_id,
                next_ingest_seq: AtomicU64::new(0),
                routes: Arc::new(routes),
                metrics,
                strict_routing: cfg.strict_routing,
            }),
        }
    }

    /// Deliver `event` to every route of its type and return how many accepted it.
    ///
    /// Unrouted events are counted and dropped, or rejected under strict routing.
    pub fn publish(&self, event: Arc<dyn Event>) -> Result<usize, TransportError> {
        let ingest_seq = self.inner.next_ingest_seq.fetch_add(1, Ordering::Relaxed);

        let enriched_event = Arc::new(EnrichedEvent {
            event,
            session_id: self.inner.session_id,
            ingest_seq,
            ingested_at: Instant::now(),
        });
        let event_type = enriched_event.event.event_type();

        let Some(routes) = self.inner.routes.table.get(event_type) else {
            self.inner.metrics.record_unrouted(event_type);

            if self.inner.strict_routing {
                return Err(TransportError::Unrouted { topic: event_type });
            }

            return Ok(0);
        };

        let mut delivered = 0;
        for route in routes {
            if route.inbox.try_deliver(Arc::clone(&enriched_event)) {
                delivered += 1;
            } else {
                route.drops_total.fetch_add(1, Ordering::Relaxed);
                warn!(
                    event_type,
                    subscriber = route.subscriber_id,
                    "route inbox full, event dropped"
                );
            }
        }
        Ok(delivered)
    }

    /// `publish(topic, payload)` for the pipeline topics.
    pub fn publish_message(
        &self,
        header: EventHeader,
        topic: Topic,
        payload: Vec<u8>,
    ) -> Result<usize, TransportError> {
        self.publish(Arc::new(TopicMessage::new(header, topic, payload)))
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    pub fn metrics(&self) -> &BusMetrics {
        &self.inner.metrics
    }

    /// Events dropped on full inboxes, summed over the subscriber's routes.
    pub fn drops_for(&self, subscriber_id: &str) -> u64 {
        self.inner
            .routes
            .table
            .values()
            .flatten()
            .filter(|r| r.subscriber_id == subscriber_id)
            .map(|r| r.drops_total.load(Ordering::Relaxed))
            .sum()
    }
}
