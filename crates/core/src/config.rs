use std::path::PathBuf;

use crate::store::{get_errors_path, get_log_path, get_settings_path};

/// Where the aggregator keeps its stores and how it bounds the join table.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub data_dir: PathBuf,
    /// Cap on one-sided join entries; `None` keeps every key. Only honoured
    /// the first time a data dir is opened, later opens reuse the recorded cap.
    pub max_pending: Option<usize>,
}

impl AggregatorConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_pending: None,
        }
    }

    pub fn with_max_pending(mut self, max_pending: Option<usize>) -> Self {
        self.max_pending = max_pending;
        self
    }

    pub fn log_path(&self) -> PathBuf {
        get_log_path(&self.data_dir)
    }

    pub fn errors_path(&self) -> PathBuf {
        get_errors_path(&self.data_dir)
    }

    pub fn settings_path(&self) -> PathBuf {
        get_settings_path(&self.data_dir)
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::new(get_root_data_dir())
    }
}

pub fn get_root_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("joinwatch")
}
