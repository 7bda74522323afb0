//! Cleanup of rolled log files past their retention period.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;
use tracing::{debug, info, warn};

use super::logger::LOG_FILE_NAME;

/// Delete rolled log files in `log_dir` last modified more than
/// `retention_days` ago. Returns how many files were removed.
///
/// Only files whose name starts with the logger's base file name are
/// considered.
pub async fn prune_old_logs(log_dir: impl AsRef<Path>, retention_days: u32) -> Result<usize> {
    let log_dir = log_dir.as_ref();

    if !log_dir.exists() {
        debug!(path = %log_dir.display(), "log directory does not exist yet");
        return Ok(0);
    }

    let cutoff = Utc::now() - Duration::days(i64::from(retention_days));
    let mut deleted = 0;

    let mut entries = tokio::fs::read_dir(log_dir)
        .await
        .context("failed to read log directory")?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .context("failed to read directory entry")?
    {
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_NAME));
        if !is_log {
            continue;
        }

        let modified: DateTime<Utc> = entry
            .metadata()
            .await
            .and_then(|m| m.modified())
            .context("failed to read log file modification time")?
            .into();

        if modified < cutoff {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), "deleted expired log file");
                    deleted += 1;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "failed to delete log file"),
            }
        }
    }

    if deleted > 0 {
        info!(deleted, retention_days, "pruned old log files");
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration as StdDuration, SystemTime};

    fn touch(dir: &Path, name: &str, age_days: u64) {
        let file = File::create(dir.join(name)).unwrap();
        let modified = SystemTime::now() - StdDuration::from_secs(age_days * 86_400);
        file.set_modified(modified).unwrap();
    }

    #[tokio::test]
    async fn test_prunes_only_old_log_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "advisor-cache.log.2020-01-01", 40);
        touch(dir.path(), "advisor-cache.log.2020-02-01", 2);
        touch(dir.path(), "notes.txt", 40);

        let deleted = prune_old_logs(dir.path(), 30).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(!dir.path().join("advisor-cache.log.2020-01-01").exists());
        assert!(dir.path().join("advisor-cache.log.2020-02-01").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_missing_directory_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(prune_old_logs(&missing, 30).await.unwrap(), 0);
    }
}
