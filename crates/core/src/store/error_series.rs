use std::path::{Path, PathBuf};

use tokio::fs::File;
use tracing::warn;

use crate::{
    error::StoreError,
    store::{append_durable, open_append, read_or_empty, split_records},
    types::format_decimal,
};

/// Append-only sequence of emitted RMSE values, one decimal per line.
pub struct ErrorSeries {
    path: PathBuf,
    file: File,
    last: Option<f64>,
    len: usize,
    torn_tail: bool,
}

impl ErrorSeries {
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let (values, torn_tail) = read_values(path).await?;
        let file = open_append(path).await?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            last: values.last().copied(),
            len: values.len(),
            torn_tail,
        })
    }

    /// Read the whole series, as a plot poller would.
    pub async fn load(path: &Path) -> Result<Vec<f64>, StoreError> {
        read_values(path).await.map(|(values, _)| values)
    }

    pub async fn append(&mut self, value: f64) -> Result<(), StoreError> {
        let record = format!("{}\n", format_decimal(value));
        append_durable(&mut self.file, &self.path, &mut self.torn_tail, &record).await?;
        self.last = Some(value);
        self.len += 1;
        Ok(())
    }

    /// Last value on disk, if any.
    pub fn last(&self) -> Option<f64> {
        self.last
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn read_values(path: &Path) -> Result<(Vec<f64>, bool), StoreError> {
    let content = read_or_empty(path).await?;
    let records = split_records(&content);

    let values = records
        .lines
        .iter()
        .map(|(line, text)| {
            text.parse::<f64>().map_err(|e| StoreError::Corrupt {
                path: path.to_path_buf(),
                line: *line,
                reason: format!("bad value {text:?}: {e}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(fragment) = records.torn {
        warn!(
            path = %path.display(),
            fragment,
            "ignoring unterminated trailing value in error series"
        );
    }

    Ok((values, records.torn.is_some()))
}
