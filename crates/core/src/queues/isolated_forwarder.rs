use std::{pin::Pin, sync::Arc};

use tokio::sync::{Notify, mpsc};

const INBOX_CAPACITY: usize = 16;

/// Hands items to a drain task that forwards them into a bounded output channel,
/// so a slow consumer never stalls the publisher.
pub struct IsolatedForwarder<T> {
    inbox_tx: mpsc::Sender<T>,
}

/// Drain tasks that must be spawned before anything is published.
pub struct StartupTasks {
    pub tokio: Vec<Pin<Box<dyn Future<Output = ()> + Send>>>,
}

impl<T: Send + 'static> IsolatedForwarder<T> {
    pub fn new(
        output_buffer: usize,
        notify_any: Arc<Notify>,
    ) -> (
        IsolatedForwarder<T>,
        mpsc::Receiver<T>,
        Pin<Box<dyn Future<Output = ()> + Send>>,
    ) {
        let (inbox_tx, mut inbox_rx) = mpsc::channel::<T>(INBOX_CAPACITY);
        let (out_tx, out_rx) = mpsc::channel::<T>(output_buffer);

        let drain_task = Box::pin(async move {
            while let Some(value) = inbox_rx.recv().await {
                if out_tx.send(value).await.is_err() {
                    break;
                }
                notify_any.notify_one();
            }
        });

        (IsolatedForwarder { inbox_tx }, out_rx, drain_task)
    }

    pub fn try_send(&self, value: T) -> Result<(), T> {
        self.inbox_tx.try_send(value).map_err(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drain_task_forwards_in_order() {
        let notify = Arc::new(Notify::new());
        let (fwd, mut out_rx, drain) = IsolatedForwarder::new(4, Arc::clone(&notify));
        tokio::spawn(drain);

        fwd.try_send(1).unwrap();
        fwd.try_send(2).unwrap();

        assert_eq!(out_rx.recv().await, Some(1));
        assert_eq!(out_rx.recv().await, Some(2));
    }

    #[test]
    fn full_inbox_rejects_newest() {
        let (fwd, _out_rx, _drain) = IsolatedForwarder::new(1, Arc::new(Notify::new()));
        for i in 0..INBOX_CAPACITY {
            fwd.try_send(i).unwrap();
        }
        assert_eq!(fwd.try_send(99), Err(99));
    }
}
