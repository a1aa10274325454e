use std::{any::Any, time::SystemTime};

use uuid::Uuid;

use crate::{
    events::{Event, EventHeader},
    types::Topic,
};

/// Raw payload published on one of the pipeline topics.
#[derive(Clone, Debug, serde::Serialize)]
pub struct TopicMessage {
    pub header: EventHeader,
    pub topic: Topic,
    pub payload: Vec<u8>,
}

impl TopicMessage {
    pub fn new(header: EventHeader, topic: Topic, payload: Vec<u8>) -> Self {
        Self {
            header,
            topic,
            payload,
        }
    }

    /// Serialize `body` as JSON for `topic`.
    pub fn json<T: serde::Serialize>(
        header: EventHeader,
        topic: Topic,
        body: &T,
    ) -> serde_json::Result<Self> {
        Ok(Self::new(header, topic, serde_json::to_vec(body)?))
    }
}

impl Event for TopicMessage {
    fn event_id(&self) -> Uuid {
        self.header.event_id
    }

    fn parent_ids(&self) -> &[Uuid] {
        &self.header.parent_ids
    }

    fn event_type(&self) -> &'static str {
        self.topic.name()
    }

    fn timestamp(&self) -> SystemTime {
        self.header.timestamp
    }

    fn as_any(&self) -> &dyn Any {
        self as &dyn Any
    }
}
