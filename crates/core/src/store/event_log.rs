use std::path::{Path, PathBuf};

use tokio::fs::File;
use tracing::{debug, warn};

use crate::{
    error::StoreError,
    store::{append_durable, open_append, read_or_empty, split_records},
    types::{CorrelationKey, Field, FieldEvent, LogPosition, format_decimal},
};

/// Append-only record of every inbound field event, one `<ts> <field> <value>` line each.
pub struct EventLog {
    path: PathBuf,
    file: File,
    next_seq: u64,
    torn_tail: bool,
}

impl EventLog {
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let (events, torn_tail) = read_events(path).await?;
        let file = open_append(path).await?;

        debug!(path = %path.display(), events = events.len(), torn_tail, "opened event log");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            next_seq: events.len() as u64,
            torn_tail,
        })
    }

    /// Sequence number the next appended event will receive.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `event`; returns only after the line is synced to disk.
    pub async fn append(&mut self, event: &FieldEvent) -> Result<LogPosition, StoreError> {
        append_durable(
            &mut self.file,
            &self.path,
            &mut self.torn_tail,
            &format_line(event),
        )
        .await?;

        let position = LogPosition(self.next_seq);
        self.next_seq += 1;
        Ok(position)
    }

    /// Every previously appended event, in append order.
    pub async fn replay_all(&self) -> Result<Vec<FieldEvent>, StoreError> {
        let (events, _) = read_events(&self.path).await?;
        Ok(events)
    }
}

fn format_line(event: &FieldEvent) -> String {
    format!(
        "{} {} {}\n",
        event.key,
        event.field.name(),
        format_decimal(event.value)
    )
}

fn parse_line(line: &str, seq: u64) -> Result<FieldEvent, String> {
    let mut parts = line.split_whitespace();
    let (Some(ts), Some(name), Some(value), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err("expected `<ts> <field> <value>`".to_string());
    };

    let key = ts
        .parse::<CorrelationKey>()
        .map_err(|e| format!("bad ts {ts:?}: {e}"))?;
    let field = Field::from_name(name).ok_or_else(|| format!("unknown field {name:?}"))?;
    let value = value
        .parse::<f64>()
        .map_err(|e| format!("bad value {value:?}: {e}"))?;

    Ok(FieldEvent {
        key,
        field,
        value,
        arrival_seq: seq,
    })
}

async fn read_events(path: &Path) -> Result<(Vec<FieldEvent>, bool), StoreError> {
    let content = read_or_empty(path).await?;
    let records = split_records(&content);

    let mut events = Vec::with_capacity(records.lines.len());
    for (line, text) in records.lines {
        let event =
            parse_line(text, events.len() as u64).map_err(|reason| StoreError::Corrupt {
                path: path.to_path_buf(),
                line,
                reason,
            })?;
        events.push(event);
    }

    if let Some(fragment) = records.torn {
        warn!(
            path = %path.display(),
            fragment,
            "ignoring unterminated trailing record in event log"
        );
    }

    Ok((events, records.torn.is_some()))
}
