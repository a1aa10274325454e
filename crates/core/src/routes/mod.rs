use std::{
    collections::HashMap,
    sync::{Arc, atomic::AtomicU64},
};

use crate::{
    events::EnrichedEvent,
    queues::{FifoDropOldestQueue, IsolatedForwarder, UnboundedQueue},
};

/// Event type -> every subscriber inbox that wants it.
pub struct Routes {
    pub table: HashMap<&'static str, Vec<Route>>,
}

pub struct Route {
    pub subscriber_id: &'static str,
    pub inbox: RouteInbox,
    pub drops_total: Arc<AtomicU64>,
}

pub enum RouteInbox {
    Unbounded(Arc<UnboundedQueue<Arc<EnrichedEvent>>>),
    FifoDropOldest(Arc<FifoDropOldestQueue<Arc<EnrichedEvent>>>),
    Isolated(IsolatedForwarder<Arc<EnrichedEvent>>),
}

impl RouteInbox {
    /// `false` when an event was lost: the new one rejected or an old one overwritten.
    pub fn try_deliver(&self, event: Arc<EnrichedEvent>) -> bool {
        match self {
            RouteInbox::Unbounded(q) => {
                q.push(event);
                true
            }
            RouteInbox::FifoDropOldest(q) => q.push_overwrite(event).is_none(),
            RouteInbox::Isolated(fwd) => fwd.try_send(event).is_ok(),
        }
    }
}
