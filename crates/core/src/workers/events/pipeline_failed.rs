use std::{any::Any, sync::Arc, time::SystemTime};

use serde::Serialize;
use uuid::Uuid;

use crate::events::Event;

/// Published by a stage right before it stops on an unrecoverable error.
#[derive(Clone, Debug, Serialize)]
pub struct PipelineFailed {
    pub event_id: Uuid,
    pub ts: SystemTime,
    pub parents: [Uuid; 1],
    pub stage: &'static str,
    pub message: String,
}

impl PipelineFailed {
    pub const EVENT_TYPE: &'static str = "pipeline.failed";

    pub fn new(event: Arc<dyn Event>, subscriber_id: &'static str, message: String) -> Self {
        Self {
            message,
            event_id: Uuid::new_v4(),
            ts: SystemTime::now(),
            parents: [event.event_id()],
            stage: subscriber_id,
        }
    }

    /// Failure of a stage that has no triggering event, such as a source loop.
    pub fn detached(stage: &'static str, message: String) -> Self {
        Self {
            message,
            event_id: Uuid::new_v4(),
            ts: SystemTime::now(),
            parents: [Uuid::nil()],
            stage,
        }
    }
}

impl Event for PipelineFailed {
    fn event_id(&self) -> Uuid {
        self.event_id
    }

    fn parent_ids(&self) -> &[Uuid] {
        &self.parents
    }

    fn event_type(&self) -> &'static str {
        Self::EVENT_TYPE
    }

    fn timestamp(&self) -> SystemTime {
        self.ts
    }

    fn as_any(&self) -> &dyn Any {
        self as &dyn Any
    }
}
