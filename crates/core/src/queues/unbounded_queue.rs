use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use tokio::sync::Notify;

/// Lossless FIFO inbox; producers never block and nothing is dropped.
pub struct UnboundedQueue<T> {
    inner: Arc<UnboundedInner<T>>,
}

struct UnboundedInner<T> {
    buf: Mutex<VecDeque<T>>,
    notify_any: Arc<Notify>,
}

pub struct UnboundedReceiver<T> {
    inner: Arc<UnboundedInner<T>>,
}

impl<T> UnboundedQueue<T> {
    pub fn new(notify_any: Arc<Notify>) -> Self {
        Self {
            inner: Arc::new(UnboundedInner {
                buf: Mutex::new(VecDeque::new()),
                notify_any,
            }),
        }
    }

    pub fn push(&self, value: T) {
        self.inner
            .buf
            .lock()
            .expect("UnboundedQueue poisoned")
            .push_back(value);
        self.inner.notify_any.notify_one();
    }

    pub fn receiver(&self) -> UnboundedReceiver<T> {
        UnboundedReceiver {
            inner: self.inner.clone(),
        }
    }
}

impl<T> UnboundedReceiver<T> {
    pub fn try_recv(&self) -> Option<T> {
        self.inner
            .buf
            .lock()
            .expect("UnboundedQueue poisoned")
            .pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.buf.lock().expect("UnboundedQueue poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_every_item_in_order() {
        let q = UnboundedQueue::new(Arc::new(Notify::new()));
        let rx = q.receiver();
        for i in 0..1000 {
            q.push(i);
        }
        assert_eq!(rx.len(), 1000);
        assert_eq!(rx.try_recv(), Some(0));
        assert_eq!(rx.try_recv(), Some(1));
    }
}
