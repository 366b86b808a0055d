use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{ReleaseError, Result};

/// Sidecar file inside the git directory holding the last fetch time
pub const LAST_FETCH_FILE_NAME: &str = "last-fetch.txt";

/// Whether the remote has to be fetched again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDecision {
    Fetch,
    Skip { seconds_since_last: u64 },
}

/// Rate limits fetches using a Unix timestamp persisted next to the
/// repository metadata.
#[derive(Debug, Clone)]
pub struct FetchThrottle {
    path: PathBuf,
    grace_period: Duration,
}

impl FetchThrottle {
    pub fn new(git_dir: &Path, grace_period: Duration) -> Self {
        FetchThrottle {
            path: git_dir.join(LAST_FETCH_FILE_NAME),
            grace_period,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unix time of the last recorded fetch
    ///
    /// # Returns
    /// * `Ok(None)` - No fetch has been recorded
    /// * `Err(ReleaseError::InvalidTimestamp)` - The file holds something
    ///   other than a decimal `u64`
    pub fn last_fetch(&self) -> Result<Option<u64>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!(
                    "No last-fetch timestamp at '{}', fetching",
                    self.path.display()
                );
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        contents
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ReleaseError::InvalidTimestamp {
                path: self.path.clone(),
                value: contents.clone(),
            })
    }

    /// Decide whether to fetch at Unix time `now`.
    ///
    /// Fetches when nothing was recorded, when more than the grace period has
    /// passed, or when the recorded time lies in the future.
    pub fn decide(&self, now: u64) -> Result<FetchDecision> {
        let Some(last) = self.last_fetch()? else {
            return Ok(FetchDecision::Fetch);
        };

        if last > now {
            log::debug!("Last fetch time {} is in the future, fetching", last);
            return Ok(FetchDecision::Fetch);
        }

        let elapsed = now - last;
        if elapsed > self.grace_period.as_secs() {
            Ok(FetchDecision::Fetch)
        } else {
            Ok(FetchDecision::Skip {
                seconds_since_last: elapsed,
            })
        }
    }

    /// Persist `now` as the last fetch time.
    pub fn record(&self, now: u64) -> Result<()> {
        fs::write(&self.path, now.to_string())?;
        Ok(())
    }
}

/// Seconds since the Unix epoch
pub fn unix_now() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .map_err(|e| ReleaseError::config(format!("System clock is before the Unix epoch: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn throttle(dir: &TempDir) -> FetchThrottle {
        FetchThrottle::new(dir.path(), Duration::from_secs(60))
    }

    #[test]
    fn test_missing_sidecar_fetches() {
        let dir = TempDir::new().unwrap();
        assert_eq!(throttle(&dir).decide(1_000).unwrap(), FetchDecision::Fetch);
    }

    #[test]
    fn test_recent_fetch_is_skipped() {
        let dir = TempDir::new().unwrap();
        let throttle = throttle(&dir);
        throttle.record(1_000).unwrap();

        assert_eq!(
            throttle.decide(1_030).unwrap(),
            FetchDecision::Skip {
                seconds_since_last: 30
            }
        );
        assert_eq!(
            throttle.decide(1_060).unwrap(),
            FetchDecision::Skip {
                seconds_since_last: 60
            }
        );
        assert_eq!(throttle.decide(1_061).unwrap(), FetchDecision::Fetch);
    }

    #[test]
    fn test_future_timestamp_fetches() {
        let dir = TempDir::new().unwrap();
        let throttle = throttle(&dir);
        throttle.record(5_000).unwrap();
        assert_eq!(throttle.decide(1_000).unwrap(), FetchDecision::Fetch);
    }

    #[test]
    fn test_record_writes_plain_decimal() {
        let dir = TempDir::new().unwrap();
        let throttle = throttle(&dir);
        throttle.record(1_700_000_000).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join(LAST_FETCH_FILE_NAME)).unwrap(),
            "1700000000"
        );
    }

    #[test]
    fn test_corrupt_sidecar_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(LAST_FETCH_FILE_NAME), "yesterday").unwrap();
        assert!(matches!(
            throttle(&dir).decide(1_000),
            Err(ReleaseError::InvalidTimestamp { .. })
        ));
    }
}
