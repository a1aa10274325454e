use std::{any::Any, sync::Arc, time::SystemTime};

use erased_serde::Serialize as ErasedSerialize;
use tokio::time::Instant;
use uuid::Uuid;

pub trait Event: Send + Sync + ErasedSerialize + 'static {
    fn event_id(&self) -> Uuid;
    fn parent_ids(&self) -> &[Uuid];
    fn event_type(&self) -> &'static str;
    fn timestamp(&self) -> SystemTime;

    fn schema_version(&self) -> u32 {
        1
    }

    fn as_any(&self) -> &dyn Any;
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct EventHeader {
    pub event_id: Uuid,
    pub parent_ids: Vec<Uuid>,
    pub timestamp: SystemTime,
}

impl EventHeader {
    pub fn root() -> Self {
        Self {
            event_id: Uuid::new_v4(),
            parent_ids: Vec::new(),
            timestamp: SystemTime::now(),
        }
    }

    pub fn child_of(parent_event_id: Uuid) -> Self {
        Self {
            parent_ids: vec![parent_event_id],
            ..Self::root()
        }
    }
}

pub struct EnrichedEvent {
    pub event: Arc<dyn Event>,
    pub ingest_seq: u64,
    pub session_id: Uuid,
    pub ingested_at: Instant,
}

pub fn downcast_ref<T: 'static>(e: &Arc<dyn Event>) -> Option<&T> {
    e.as_any().downcast_ref::<T>()
}

pub fn expect<'a, T: 'static>(
    e: &'a Arc<dyn Event>,
    expected_event_type: &'static str,
) -> anyhow::Result<&'a T> {
    downcast_ref::<T>(e).ok_or_else(|| {
        anyhow::anyhow!(
            "expected event_type={}, got={}",
            expected_event_type,
            e.event_type()
        )
    })
}
