use std::future::Future;
use std::time::Duration;

use serde::{
    Deserialize,
    Serialize,
};
use tokio::time::{
    Instant,
    sleep,
};
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::errors::*;
use crate::k8s::ClusterError;
use crate::prelude::*;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollSettings {
    #[serde(with = "humantime_duration")]
    pub timeout: Duration,

    #[serde(with = "humantime_duration")]
    pub interval: Duration,
}

impl PollSettings {
    pub fn new(timeout: Duration, interval: Duration) -> PollSettings {
        PollSettings { timeout, interval }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            timeout: Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS),
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

// A probe either succeeds, fails in a way that might clear up on its own (the object hasn't been
// reconciled yet), or fails in a way that no amount of waiting will fix.
#[derive(Debug)]
pub enum ProbeFailure {
    Retry(anyhow::Error),
    Terminal(anyhow::Error),
}

impl From<ClusterError> for ProbeFailure {
    fn from(err: ClusterError) -> Self {
        if err.is_terminal() {
            ProbeFailure::Terminal(err.into())
        } else {
            ProbeFailure::Retry(err.into())
        }
    }
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("timed out after {timeout:?} ({attempts} attempts) waiting for {description}: {last_error}")]
    Timeout {
        description: String,
        timeout: Duration,
        attempts: usize,
        last_error: String,
    },

    #[error("cancelled while waiting for {0}")]
    Cancelled(String),
}

/// Repeatedly call `probe` until it succeeds, returns a terminal failure, or the timeout in
/// `settings` elapses.  The probe always runs at least once, and consecutive attempts are separated
/// by at least `settings.interval`.  Cancelling `cancel` aborts the wait at the next attempt or
/// in the middle of a sleep, whichever comes first.
pub async fn poll_until<T, F, Fut>(
    settings: &PollSettings,
    cancel: &CancellationToken,
    description: &str,
    mut probe: F,
) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProbeFailure>>,
{
    let start = Instant::now();
    let mut attempts = 0;

    loop {
        if cancel.is_cancelled() {
            bail!(PollError::Cancelled(description.into()));
        }

        attempts += 1;
        let last_error = match probe().await {
            Ok(res) => {
                debug!("done waiting for {description} after {attempts} attempt(s)");
                return Ok(res);
            },
            Err(ProbeFailure::Terminal(err)) => {
                return Err(err.context(format!("unrecoverable error while waiting for {description}")));
            },
            Err(ProbeFailure::Retry(err)) => err,
        };

        if start.elapsed() >= settings.timeout {
            bail!(PollError::Timeout {
                description: description.into(),
                timeout: settings.timeout,
                attempts,
                last_error: format!("{last_error:#}"),
            });
        }

        trace!("still waiting for {description}: {last_error}");
        tokio::select! {
            _ = cancel.cancelled() => bail!(PollError::Cancelled(description.into())),
            _ = sleep(settings.interval) => (),
        }
    }
}

mod humantime_duration {
    use std::time::Duration;

    use serde::{
        Deserialize,
        Deserializer,
        Serializer,
        de,
    };

    pub fn serialize<S: Serializer>(d: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&humantime::format_duration(*d).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(de)?;
        humantime::parse_duration(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{
        AtomicUsize,
        Ordering,
    };

    use assertables::*;
    use rstest::*;

    use super::*;

    #[fixture]
    fn settings() -> PollSettings {
        PollSettings::new(Duration::from_secs(10), Duration::from_millis(2))
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_poll_until_immediate_success(settings: PollSettings) {
        let res = poll_until(&settings, &CancellationToken::new(), "nothing", || async { Ok(42) })
            .await
            .unwrap();
        assert_eq!(res, 42);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_poll_until_eventual_success(settings: PollSettings) {
        let calls = Arc::new(AtomicUsize::new(0));
        let start = Instant::now();

        let res = poll_until(&settings, &CancellationToken::new(), "the third call", || {
            let calls = calls.clone();
            async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    n if n < 2 => Err(ProbeFailure::Retry(anyhow!("not yet"))),
                    n => Ok(n),
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(res, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_ge!(start.elapsed(), settings.interval * 2);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_poll_until_timeout(settings: PollSettings) {
        let start = Instant::now();
        let err = poll_until(&settings, &CancellationToken::new(), "godot", || async {
            Err::<(), _>(ProbeFailure::Retry(anyhow!("he's not here")))
        })
        .await
        .unwrap_err();

        assert_ge!(start.elapsed(), settings.timeout);
        match err.downcast_ref::<PollError>().unwrap() {
            PollError::Timeout { description, last_error, attempts, .. } => {
                assert_eq!(description, "godot");
                assert_eq!(last_error, "he's not here");
                assert_gt!(*attempts, 1);
            },
            e => panic!("unexpected error: {e}"),
        }
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_poll_until_zero_timeout_still_probes() {
        let settings = PollSettings::new(Duration::ZERO, Duration::from_millis(2));
        let calls = AtomicUsize::new(0);
        let err = poll_until(&settings, &CancellationToken::new(), "once", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(ProbeFailure::Retry(anyhow!("nope"))) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err.downcast_ref::<PollError>(), Some(PollError::Timeout { attempts: 1, .. })));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_poll_until_terminal(settings: PollSettings) {
        let calls = AtomicUsize::new(0);
        let start = Instant::now();
        let err = poll_until(&settings, &CancellationToken::new(), "forbidden thing", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(ProbeFailure::Terminal(anyhow!(ClusterError::Terminal("forbidden".into())))) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_lt!(start.elapsed(), settings.interval);
        assert!(matches!(err.root_cause().downcast_ref::<ClusterError>(), Some(ClusterError::Terminal(_))));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_poll_until_already_cancelled(settings: PollSettings) {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let calls = AtomicUsize::new(0);
        let err = poll_until(&settings, &cancel, "never", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(matches!(err.downcast_ref::<PollError>(), Some(PollError::Cancelled(_))));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_poll_until_cancelled_while_waiting() {
        let settings = PollSettings::new(Duration::from_secs(600), Duration::from_secs(5));
        let cancel = CancellationToken::new();
        let child = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(12)).await;
            child.cancel();
        });

        let start = Instant::now();
        let err = poll_until(&settings, &cancel, "forever", || async {
            Err::<(), _>(ProbeFailure::Retry(anyhow!("still no")))
        })
        .await
        .unwrap_err();

        assert_lt!(start.elapsed(), Duration::from_secs(15));
        assert!(matches!(err.downcast_ref::<PollError>(), Some(PollError::Cancelled(_))));
    }

    #[rstest]
    fn test_poll_settings_from_yaml() {
        let settings: PollSettings = serde_yaml::from_str("timeout: 30s\ninterval: 250ms\n").unwrap();
        assert_eq!(settings, PollSettings::new(Duration::from_secs(30), Duration::from_millis(250)));
    }

    #[rstest]
    fn test_poll_settings_bad_duration() {
        assert_err!(serde_yaml::from_str::<PollSettings>("timeout: soon\ninterval: 2ms\n"));
    }
}
