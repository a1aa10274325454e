//! Append-only text stores owned by the aggregator.

pub mod error_series;
pub mod event_log;
pub mod settings;

pub use error_series::*;
pub use event_log::*;
pub use settings::*;

use std::path::{Path, PathBuf};

use tokio::{
    fs::{self, File, OpenOptions},
    io::AsyncWriteExt,
};

use crate::error::StoreError;

/// Get the path of the durable event log inside a data directory
pub fn get_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join("log.txt")
}

/// Get the path of the error series inside a data directory
pub fn get_errors_path(data_dir: &Path) -> PathBuf {
    data_dir.join("errors.txt")
}

/// Get the path of the pinned store settings inside a data directory
pub fn get_settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.json")
}

/// Appended to an interrupted record before the next write so it never parses.
pub(crate) const TORN_MARKER: &str = "#torn";

/// Non-empty records of a store file with their 1-based line numbers.
pub(crate) struct Records<'a> {
    pub lines: Vec<(usize, &'a str)>,
    /// Unterminated trailing fragment left by an interrupted write.
    pub torn: Option<&'a str>,
}

pub(crate) fn split_records(content: &str) -> Records<'_> {
    let mut lines = Vec::new();
    let mut torn = None;
    let mut rest = content;
    let mut number = 0;

    while !rest.is_empty() {
        number += 1;
        match rest.find('\n') {
            Some(end) => {
                let line = rest[..end].trim();
                if !line.is_empty() && !line.ends_with(TORN_MARKER) {
                    lines.push((number, line));
                }
                rest = &rest[end + 1..];
            }
            None => {
                if !rest.trim().is_empty() {
                    torn = Some(rest);
                }
                break;
            }
        }
    }

    Records { lines, torn }
}

/// Missing files read as empty, and so does anything that is not a regular
/// file (a device or fifo has no history to replay).
pub(crate) async fn read_or_empty(path: &Path) -> Result<String, StoreError> {
    match fs::metadata(path).await {
        Ok(meta) if !meta.is_file() => return Ok(String::new()),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(String::new()),
        Err(e) => return Err(StoreError::io(path, e)),
    }

    match fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

pub(crate) async fn open_append(path: &Path) -> Result<File, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| StoreError::io(path, e))
}

/// Write one record and make it durable before returning. A torn tail left by
/// an earlier crash is sealed with [`TORN_MARKER`] first.
pub(crate) async fn append_durable(
    file: &mut File,
    path: &Path,
    torn_tail: &mut bool,
    record: &str,
) -> Result<(), StoreError> {
    let mut buf = String::with_capacity(record.len() + TORN_MARKER.len() + 2);
    if *torn_tail {
        buf.push(' ');
        buf.push_str(TORN_MARKER);
        buf.push('\n');
    }
    buf.push_str(record);

    file.write_all(buf.as_bytes())
        .await
        .map_err(|e| StoreError::io(path, e))?;
    file.flush().await.map_err(|e| StoreError::io(path, e))?;
    file.sync_data().await.map_err(|e| StoreError::io(path, e))?;
    *torn_tail = false;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped_and_numbered() {
        let records = split_records("a\n\n b \n");
        assert_eq!(records.lines, vec![(1, "a"), (3, "b")]);
        assert!(records.torn.is_none());
    }

    #[test]
    fn unterminated_tail_is_reported_as_torn() {
        let records = split_records("1.0\n2.");
        assert_eq!(records.lines, vec![(1, "1.0")]);
        assert_eq!(records.torn, Some("2."));
    }

    #[test]
    fn sealed_fragments_are_not_records() {
        let records = split_records("1.0\n2. #torn\n3.0\n");
        assert_eq!(records.lines, vec![(1, "1.0"), (3, "3.0")]);
    }

    #[test]
    fn empty_content_has_no_records() {
        let records = split_records("");
        assert!(records.lines.is_empty());
        assert!(records.torn.is_none());
    }
}
