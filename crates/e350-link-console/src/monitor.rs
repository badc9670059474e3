/*
[INPUT]:  Device client, monitor config, shutdown token
[OUTPUT]: Live status and operation log lines, final stream/poll counters
[POS]:    Runtime layer - status stream + log poller supervision
[UPDATE]: When changing what the live view shows or how workers stop
*/

use std::io::Write;

use anyhow::Context;
use e350_link_adapter::{
    DeviceClient, OperationLogEvent, OperationLogPoller, PollStatsSnapshot, StatusSnapshot,
    StatusStream, StreamStatsSnapshot,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::render;

/// Counters collected over one monitor run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorReport {
    pub stream: StreamStatsSnapshot,
    pub poll: PollStatsSnapshot,
}

/// Runs the status stream and the log poller side by side.
pub struct Monitor {
    client: DeviceClient,
    config: MonitorConfig,
}

impl Monitor {
    pub fn new(client: DeviceClient, config: MonitorConfig) -> Self {
        Self { client, config }
    }

    /// Print every status change and every new log batch until shutdown.
    pub async fn run<W: Write>(self, shutdown: CancellationToken, mut out: W) -> anyhow::Result<MonitorReport> {
        let stream = StatusStream::new(&self.client)
            .context("create status stream")?
            .with_max_backoff(self.config.max_backoff());
        let poller = OperationLogPoller::new(self.client.clone())
            .with_interval(self.config.poll_interval());

        let stream_stats = stream.stats();
        let poll_stats = poller.stats();
        let mut snapshots = stream.subscribe();
        let mut events = poller.subscribe();

        let workers = CancellationToken::new();
        let stream_handle = stream.spawn(workers.clone());
        let poller_handle = poller.spawn(workers.clone());
        info!(url = %self.client.base_url(), "monitor started");

        let mut last_shown: Option<StatusSnapshot> = None;
        let mut last_batch: Vec<OperationLogEvent> = Vec::new();
        let mut snapshots_open = true;
        let mut events_open = true;

        while snapshots_open || events_open {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = snapshots.changed(), if snapshots_open => {
                    if changed.is_err() {
                        snapshots_open = false;
                        continue;
                    }
                    let current = snapshots.borrow_and_update().clone();
                    let Some(snapshot) = current else { continue };
                    if last_shown.as_ref() != Some(&snapshot) {
                        if snapshot.is_faulted() {
                            warn!(fault = snapshot.fault, "device reports fault");
                        }
                        writeln!(out, "{}", render::snapshot_line(&snapshot))?;
                        last_shown = Some(snapshot);
                    }
                }
                changed = events.changed(), if events_open => {
                    if changed.is_err() {
                        events_open = false;
                        continue;
                    }
                    let batch = events.borrow_and_update().clone();
                    let fresh = unseen_events(&last_batch, &batch);
                    debug!(count = batch.len(), fresh = fresh.len(), "operation log batch");
                    for event in fresh {
                        writeln!(out, "{}", render::event_line(event))?;
                    }
                    last_batch = batch;
                }
            }
        }

        workers.cancel();
        if let Err(err) = stream_handle.await {
            warn!(error = %err, "status stream task failed");
        }
        if let Err(err) = poller_handle.await {
            warn!(error = %err, "log poller task failed");
        }

        let report = MonitorReport {
            stream: stream_stats.snapshot(),
            poll: poll_stats.snapshot(),
        };
        info!(
            frames_applied = report.stream.frames_applied,
            error_frames = report.stream.error_frames,
            malformed_frames = report.stream.malformed_frames,
            connect_failures = report.stream.connect_failures,
            polls_ok = report.poll.polls_ok,
            polls_failed = report.poll.polls_failed,
            ticks_skipped = report.poll.ticks_skipped,
            "monitor stopped"
        );
        Ok(report)
    }
}

/// Events of `current` that `previous` did not already hold.
///
/// Each poll returns the server's whole retained log, so only the
/// difference is new to an append-only console.
fn unseen_events<'a>(
    previous: &[OperationLogEvent],
    current: &'a [OperationLogEvent],
) -> Vec<&'a OperationLogEvent> {
    current
        .iter()
        .filter(|event| !previous.contains(event))
        .collect()
}
