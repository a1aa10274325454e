use std::sync::Arc;

use tokio::sync::{Notify, mpsc};

use crate::{
    events::EnrichedEvent,
    queues::{FifoDropOldestReceiver, UnboundedReceiver},
};

pub enum FifoReceiver {
    Unbounded(UnboundedReceiver<Arc<EnrichedEvent>>),
    FifoDropOldest(FifoDropOldestReceiver<Arc<EnrichedEvent>>),
    Isolated(mpsc::Receiver<Arc<EnrichedEvent>>),
}

impl FifoReceiver {
    fn try_recv(&mut self) -> Option<Arc<EnrichedEvent>> {
        match self {
            FifoReceiver::Unbounded(r) => r.try_recv(),
            FifoReceiver::FifoDropOldest(r) => r.try_recv(),
            FifoReceiver::Isolated(r) => r.try_recv().ok(),
        }
    }
}

pub struct FifoInput {
    pub event_type: &'static str,
    pub receiver: FifoReceiver,
}

/// Every inbox of one subscriber, drained by a single loop.
pub struct WorkerInputs {
    pub fifos: Vec<FifoInput>,
    pub notify_any: Arc<Notify>,
    pub fifo_index: usize,
}

pub struct WorkerItem {
    pub event_type: &'static str,
    pub event: Arc<EnrichedEvent>,
}

impl WorkerInputs {
    /// Next item from any input, visiting inputs round-robin so one busy topic
    /// cannot starve the others.
    pub async fn next(&mut self) -> WorkerItem {
        loop {
            if !self.fifos.is_empty() {
                let start = self.fifo_index;

                loop {
                    let i = self.fifo_index;
                    self.fifo_index = (self.fifo_index + 1) % self.fifos.len();
                    let fifo = &mut self.fifos[i];

                    if let Some(event) = fifo.receiver.try_recv() {
                        return WorkerItem {
                            event_type: fifo.event_type,
                            event,
                        };
                    }

                    if self.fifo_index == start {
                        break;
                    }
                }
            }
            self.notify_any.notified().await;
        }
    }
}
