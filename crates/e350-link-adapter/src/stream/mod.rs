/*
[INPUT]:  Device push channel (server-sent events)
[OUTPUT]: Live StatusSnapshot cell and stream counters
[POS]:    Stream layer - real-time status
[UPDATE]: When changing framing or connection logic
*/

pub mod client;
pub mod sse;

pub use client::{FrameOutcome, StatusStream, StreamStats, StreamStatsSnapshot};
pub use sse::SseDecoder;
