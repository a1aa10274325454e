use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use tokio::sync::Notify;

/// Bounded inbox that keeps the newest `capacity` items.
pub struct FifoDropOldestQueue<T> {
    inner: Arc<FifoDropOldestInner<T>>,
}

struct FifoDropOldestInner<T> {
    buf: Mutex<VecDeque<T>>,
    capacity: usize,
    notify_any: Arc<Notify>,
}

pub struct FifoDropOldestReceiver<T> {
    inner: Arc<FifoDropOldestInner<T>>,
}

impl<T> FifoDropOldestQueue<T> {
    pub fn new(capacity: usize, notify_any: Arc<Notify>) -> Self {
        assert!(capacity > 0);

        Self {
            inner: Arc::new(FifoDropOldestInner {
                buf: Mutex::new(VecDeque::with_capacity(capacity)),
                capacity,
                notify_any,
            }),
        }
    }

    /// Push `value`, evicting the oldest item when full. Returns the evicted item.
    pub fn push_overwrite(&self, value: T) -> Option<T> {
        let mut buf = self.inner.buf.lock().expect("FifoDropOldestQueue poisoned");
        let evicted = if buf.len() >= self.inner.capacity {
            buf.pop_front()
        } else {
            None
        };
        buf.push_back(value);
        drop(buf);
        self.inner.notify_any.notify_one();
        evicted
    }

    pub fn receiver(&self) -> FifoDropOldestReceiver<T> {
        FifoDropOldestReceiver {
            inner: self.inner.clone(),
        }
    }
}

impl<T> FifoDropOldestReceiver<T> {
    pub fn try_recv(&self) -> Option<T> {
        self.inner
            .buf
            .lock()
            .expect("FifoDropOldestQueue poisoned")
            .pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_queue_drops_oldest() {
        let q = FifoDropOldestQueue::new(2, Arc::new(Notify::new()));
        let rx = q.receiver();
        assert_eq!(q.push_overwrite(1), None);
        assert_eq!(q.push_overwrite(2), None);
        assert_eq!(q.push_overwrite(3), Some(1));

        assert_eq!(rx.try_recv(), Some(2));
        assert_eq!(rx.try_recv(), Some(3));
        assert_eq!(rx.try_recv(), None);
    }
}
