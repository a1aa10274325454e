use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::warn;

use crate::{error::StoreError, store::read_or_empty};

/// Settings that change what replay rebuilds, pinned to the data dir on first open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub max_pending: Option<usize>,
}

impl StoreSettings {
    /// Return the settings recorded in `path`, or record `requested` if there are none.
    ///
    /// A recorded value always wins so a restart replays the log exactly as the
    /// live run applied it.
    pub async fn pin(path: &Path, requested: StoreSettings) -> Result<Self, StoreError> {
        let content = read_or_empty(path).await?;

        if content.trim().is_empty() {
            let json = serde_json::to_string_pretty(&requested).map_err(|e| {
                StoreError::Corrupt {
                    path: path.to_path_buf(),
                    line: 0,
                    reason: e.to_string(),
                }
            })?;
            fs::write(path, json)
                .await
                .map_err(|e| StoreError::io(path, e))?;
            return Ok(requested);
        }

        let pinned: StoreSettings =
            serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
                path: path.to_path_buf(),
                line: e.line(),
                reason: e.to_string(),
            })?;

        if pinned != requested {
            warn!(
                path = %path.display(),
                requested = ?requested.max_pending,
                pinned = ?pinned.max_pending,
                "max_pending differs from the value this data dir was created with, keeping the recorded one"
            );
        }
        Ok(pinned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_open_records_the_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let pinned = StoreSettings::pin(&path, StoreSettings { max_pending: Some(8) })
            .await
            .unwrap();
        assert_eq!(pinned.max_pending, Some(8));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn recorded_value_wins_over_a_new_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        StoreSettings::pin(&path, StoreSettings { max_pending: Some(1) })
            .await
            .unwrap();

        let pinned = StoreSettings::pin(&path, StoreSettings { max_pending: None })
            .await
            .unwrap();
        assert_eq!(pinned.max_pending, Some(1));
    }

    #[tokio::test]
    async fn unreadable_settings_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "max_pending=3").unwrap();

        let err = StoreSettings::pin(&path, StoreSettings { max_pending: None })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }
}
