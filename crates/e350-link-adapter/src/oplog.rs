/*
[INPUT]:  Operation log endpoint (GET /api/ops) on a fixed interval
[OUTPUT]: Latest event batch via `watch` + poll counters
[POS]:    Domain layer - operation log polling
[UPDATE]: When the poll cadence or failure handling changes
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::http::{DeviceClient, Result};
use crate::types::OperationLogEvent;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(800);

const FAILURE_LOG_LIMIT: u64 = 5;

#[derive(Debug, Default)]
pub struct PollStats {
    polls_ok: AtomicU64,
    polls_failed: AtomicU64,
    ticks_skipped: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStatsSnapshot {
    pub polls_ok: u64,
    pub polls_failed: u64,
    pub ticks_skipped: u64,
}

impl PollStats {
    pub fn snapshot(&self) -> PollStatsSnapshot {
        PollStatsSnapshot {
            polls_ok: self.polls_ok.load(Ordering::Relaxed),
            polls_failed: self.polls_failed.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Fetches the operation log on a fixed period and keeps only the newest
/// batch.
///
/// One fetch at a time: a tick that comes due while a fetch is still
/// running is skipped and counted.
#[derive(Debug)]
pub struct OperationLogPoller {
    client: DeviceClient,
    interval: Duration,
    events_tx: watch::Sender<Vec<OperationLogEvent>>,
    stats: Arc<PollStats>,
}

impl OperationLogPoller {
    pub fn new(client: DeviceClient) -> Self {
        let (events_tx, _rx) = watch::channel(Vec::new());
        Self {
            client,
            interval: DEFAULT_POLL_INTERVAL,
            events_tx,
            stats: Arc::new(PollStats::default()),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<OperationLogEvent>> {
        self.events_tx.subscribe()
    }

    pub fn events(&self) -> Vec<OperationLogEvent> {
        self.events_tx.borrow().clone()
    }

    pub fn stats(&self) -> Arc<PollStats> {
        self.stats.clone()
    }

    /// One fetch. Success replaces the list; failure leaves it as is.
    pub async fn poll_once(&self) -> Result<usize> {
        match self.client.operation_log().await {
            Ok(log) => {
                let events = log.into_events();
                let count = events.len();
                self.events_tx.send_replace(events);
                self.stats.polls_ok.fetch_add(1, Ordering::Relaxed);
                debug!(count, "operation log refreshed");
                Ok(count)
            }
            Err(err) => {
                let failures = self.stats.polls_failed.fetch_add(1, Ordering::Relaxed) + 1;
                if failures <= FAILURE_LOG_LIMIT {
                    warn!(failures, error = %err.detail(), "operation log poll failed");
                } else {
                    debug!(failures, error = %err.detail(), "operation log poll failed");
                }
                Err(err)
            }
        }
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Poll until shutdown. The first fetch happens immediately.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut expected_next = tokio::time::Instant::now();

        loop {
            let tick = tokio::select! {
                _ = shutdown.cancelled() => break,
                tick = ticker.tick() => tick,
            };

            if tick > expected_next {
                let skipped = missed_ticks(tick - expected_next, self.interval);
                if skipped > 0 {
                    self.stats.ticks_skipped.fetch_add(skipped, Ordering::Relaxed);
                    debug!(skipped, "operation log ticks skipped");
                }
            }
            expected_next = tick + self.interval;

            tokio::select! {
                _ = shutdown.cancelled() => break,
                // failures are counted and logged inside
                _ = self.poll_once() => {}
            }
        }

        debug!("operation log poller stopped");
    }
}

fn missed_ticks(late_by: Duration, interval: Duration) -> u64 {
    let interval_nanos = interval.as_nanos().max(1);
    u64::try_from(late_by.as_nanos() / interval_nanos).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ClientConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn poller_for(server: &MockServer) -> OperationLogPoller {
        let client =
            DeviceClient::with_config(ClientConfig::default(), &server.uri()).expect("client init");
        OperationLogPoller::new(client)
    }

    #[test]
    fn test_missed_ticks() {
        let interval = Duration::from_millis(800);
        assert_eq!(missed_ticks(Duration::from_millis(100), interval), 0);
        assert_eq!(missed_ticks(Duration::from_millis(800), interval), 1);
        assert_eq!(missed_ticks(Duration::from_millis(2500), interval), 3);
    }

    #[tokio::test]
    async fn test_poll_replaces_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/ops"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "events": [
                    { "ts": "12:00:01", "kind": "aux", "msg": "set bit 3=1" },
                    { "ts": "12:00:02", "kind": "task", "msg": "run task 1", "extra": { "hold_ms": 1000 } }
                ]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/ops"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "events": [ { "ts": "12:00:05", "kind": "mode", "msg": "rs=1" } ]
            })))
            .mount(&server)
            .await;

        let poller = poller_for(&server);
        assert_eq!(poller.poll_once().await.unwrap(), 2);
        assert_eq!(poller.events()[1].extra["hold_ms"], 1000);

        assert_eq!(poller.poll_once().await.unwrap(), 1);
        let events = poller.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "mode");
        assert_eq!(events[0].message, "rs=1");
    }

    #[tokio::test]
    async fn test_poll_failure_keeps_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/ops"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "events": [ { "ts": "1", "kind": "k", "msg": "m" } ]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/ops"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let poller = poller_for(&server);
        poller.poll_once().await.unwrap();
        assert!(poller.poll_once().await.is_err());
        assert_eq!(poller.events().len(), 1);

        let stats = poller.stats().snapshot();
        assert_eq!(stats.polls_ok, 1);
        assert_eq!(stats.polls_failed, 1);
    }

    #[tokio::test]
    async fn test_run_polls_until_shutdown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/ops"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "events": [] })))
            .mount(&server)
            .await;

        let poller = poller_for(&server).with_interval(Duration::from_millis(20));
        let stats = poller.stats();
        let shutdown = CancellationToken::new();
        let handle = poller.spawn(shutdown.clone());

        tokio::time::sleep(Duration::from_millis(150)).await;
        shutdown.cancel();
        handle.await.expect("poller task");

        assert!(stats.snapshot().polls_ok >= 2);
    }

    #[tokio::test]
    async fn test_slow_fetch_skips_ticks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/ops"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "events": [] }))
                    .set_delay(Duration::from_millis(120)),
            )
            .mount(&server)
            .await;

        let poller = poller_for(&server).with_interval(Duration::from_millis(30));
        let stats = poller.stats();
        let shutdown = CancellationToken::new();
        let handle = poller.spawn(shutdown.clone());

        tokio::time::sleep(Duration::from_millis(400)).await;
        shutdown.cancel();
        handle.await.expect("poller task");

        let stats = stats.snapshot();
        assert!(stats.ticks_skipped >= 1);
        assert!(stats.polls_ok <= 4);
    }
}
