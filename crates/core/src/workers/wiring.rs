use std::collections::HashMap;

use crate::{queues::QueueKind, workers::WorkerInputs};

pub struct SubscriptionSpec {
    pub subscriber_id: &'static str,
    pub inputs: Vec<InputSpec>,
}

pub struct InputSpec {
    pub event_type: &'static str,
    pub queue_kind: QueueKind,
}

/// Inputs built by the bus, waiting to be claimed by their workers.
pub struct WorkerWiring {
    inputs: HashMap<&'static str, WorkerInputs>,
}

impl WorkerWiring {
    pub fn new(inputs: HashMap<&'static str, WorkerInputs>) -> Self {
        Self { inputs }
    }

    pub fn take(&mut self, subscriber_id: &'static str) -> anyhow::Result<WorkerInputs> {
        self.inputs
            .remove(subscriber_id)
            .ok_or_else(|| anyhow::anyhow!("no wiring for subscriber_id={}", subscriber_id))
    }
}
