/*
[INPUT]:  Device push channel (GET /events, text/event-stream) + shutdown token
[OUTPUT]: Latest StatusSnapshot via `watch` + frame/connection counters
[POS]:    Stream layer - live status reconciliation
[UPDATE]: When changing frame filtering, decode rules, or reconnection backoff
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::sse::SseDecoder;
use crate::http::{DeviceClient, LinkError, Result};
use crate::types::{StatusFrame, StatusSnapshot};

const EVENTS_ENDPOINT: &str = "/events";
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);
const FAILURE_LOG_LIMIT: u64 = 5;
const RAW_LOG_MAX_BYTES: usize = 256;

/// What happened to one inbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Decoded and published as the new snapshot
    Applied,
    /// Carried a truthy `error`; state untouched
    ErrorFrame,
    /// Not a JSON object; state untouched
    Malformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamExit {
    Ended,
    Shutdown,
}

/// Counters for the failures the stream otherwise absorbs silently.
#[derive(Debug, Default)]
pub struct StreamStats {
    frames_applied: AtomicU64,
    error_frames: AtomicU64,
    malformed_frames: AtomicU64,
    connect_attempts: AtomicU64,
    connect_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStatsSnapshot {
    pub frames_applied: u64,
    pub error_frames: u64,
    pub malformed_frames: u64,
    pub connect_attempts: u64,
    pub connect_failures: u64,
}

impl StreamStats {
    pub fn snapshot(&self) -> StreamStatsSnapshot {
        StreamStatsSnapshot {
            frames_applied: self.frames_applied.load(Ordering::Relaxed),
            error_frames: self.error_frames.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
        }
    }
}

/// Keeps a single current StatusSnapshot fed from the push channel.
///
/// Frames are applied one at a time in arrival order. Each applied frame
/// replaces the snapshot in full.
#[derive(Debug)]
pub struct StatusStream {
    http_client: Client,
    events_url: Url,
    snapshot_tx: watch::Sender<Option<StatusSnapshot>>,
    stats: Arc<StreamStats>,
    max_backoff: Duration,
}

impl StatusStream {
    /// Create a stream for the device behind `client`.
    ///
    /// Uses its own connection without a whole-request timeout, since the
    /// response never ends while the device is up.
    pub fn new(client: &DeviceClient) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(client.connect_timeout())
            .build()?;
        let (snapshot_tx, _rx) = watch::channel(None);

        Ok(Self {
            http_client,
            events_url: client.url(EVENTS_ENDPOINT)?,
            snapshot_tx,
            stats: Arc::new(StreamStats::default()),
            max_backoff: DEFAULT_MAX_BACKOFF,
        })
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff.max(Duration::from_millis(1));
        self
    }

    /// Subscribe to snapshot changes; `None` until the first frame lands.
    pub fn subscribe(&self) -> watch::Receiver<Option<StatusSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    pub fn latest(&self) -> Option<StatusSnapshot> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn stats(&self) -> Arc<StreamStats> {
        self.stats.clone()
    }

    /// Decode one payload and publish it if it is a status frame.
    pub fn apply_payload(&self, payload: &str) -> FrameOutcome {
        let value = match serde_json::from_str::<Value>(payload) {
            Ok(value) if value.is_object() => value,
            Ok(_) => {
                self.record_malformed("payload is not an object", payload);
                return FrameOutcome::Malformed;
            }
            Err(err) => {
                self.record_malformed(&err.to_string(), payload);
                return FrameOutcome::Malformed;
            }
        };

        let frame: StatusFrame = match serde_json::from_value(value) {
            Ok(frame) => frame,
            Err(err) => {
                self.record_malformed(&err.to_string(), payload);
                return FrameOutcome::Malformed;
            }
        };

        if frame.is_error() {
            let count = self.stats.error_frames.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(count, error = ?frame.error, "status error frame discarded");
            return FrameOutcome::ErrorFrame;
        }

        let snapshot = StatusSnapshot::from_frame(&frame);
        self.snapshot_tx.send_replace(Some(snapshot));
        self.stats.frames_applied.fetch_add(1, Ordering::Relaxed);
        FrameOutcome::Applied
    }

    /// Spawn the connection loop on the current runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Connect, consume frames, reconnect with backoff until shutdown.
    ///
    /// Connection failures never escalate; they only delay the next update.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut retry_count: u32 = 0;

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            self.stats.connect_attempts.fetch_add(1, Ordering::Relaxed);
            match self.stream_once(&shutdown).await {
                Ok(StreamExit::Shutdown) => break,
                Ok(StreamExit::Ended) => {
                    retry_count = 0;
                    info!(url = %self.events_url, "status stream ended; reconnecting");
                }
                Err(err) => {
                    retry_count = retry_count.saturating_add(1);
                    let failures = self.stats.connect_failures.fetch_add(1, Ordering::Relaxed) + 1;
                    if failures <= FAILURE_LOG_LIMIT {
                        warn!(url = %self.events_url, retry_count, error = %err, "status stream connection failed");
                    } else {
                        debug!(url = %self.events_url, retry_count, error = %err, "status stream connection failed");
                    }
                }
            }

            let backoff = backoff_duration(retry_count.max(1), self.max_backoff);
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(backoff) => {}
            }
        }

        debug!("status stream stopped");
    }

    async fn stream_once(&self, shutdown: &CancellationToken) -> Result<StreamExit> {
        let request = self
            .http_client
            .get(self.events_url.clone())
            .header(ACCEPT, "text/event-stream");

        let response = tokio::select! {
            _ = shutdown.cancelled() => return Ok(StreamExit::Shutdown),
            response = request.send() => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(LinkError::Stream(format!(
                "push channel answered HTTP {}",
                status.as_u16()
            )));
        }

        info!(url = %self.events_url, "status stream connected");
        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(StreamExit::Shutdown),
                chunk = body.next() => match chunk {
                    Some(Ok(bytes)) => self.apply_chunk(&mut decoder, &bytes),
                    Some(Err(err)) => return Err(LinkError::Stream(err.to_string())),
                    None => return Ok(StreamExit::Ended),
                },
            }
        }
    }

    fn apply_chunk(&self, decoder: &mut SseDecoder, chunk: &[u8]) {
        let dropped_before = decoder.dropped_lines();
        for payload in decoder.push(chunk) {
            self.apply_payload(&payload);
        }
        for _ in dropped_before..decoder.dropped_lines() {
            self.record_malformed("line exceeds buffer limit", "");
        }
    }

    fn record_malformed(&self, reason: &str, payload: &str) {
        let count = self.stats.malformed_frames.fetch_add(1, Ordering::Relaxed) + 1;
        let preview = truncate_for_log(payload, RAW_LOG_MAX_BYTES);
        if count <= FAILURE_LOG_LIMIT {
            warn!(count, reason, payload = %preview, "status frame dropped");
        } else {
            debug!(count, reason, payload = %preview, "status frame dropped");
        }
    }
}

fn backoff_duration(retry_count: u32, max: Duration) -> Duration {
    let exp = retry_count.saturating_sub(1).min(63);
    let secs = 1u64.checked_shl(exp).unwrap_or(u64::MAX);
    Duration::from_secs(secs).min(max)
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}
