/*
[INPUT]:  Raw byte chunks of a text/event-stream response
[OUTPUT]: Complete message payloads (joined `data:` lines)
[POS]:    Stream layer - server-sent-events framing
[UPDATE]: When the push channel starts using named events or ids
*/

/// Longest line kept while waiting for its newline.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Incremental server-sent-events decoder.
///
/// Chunks may split lines (and UTF-8 sequences) anywhere; only complete
/// lines are interpreted. Named events other than `message` are dropped.
/// A line longer than [`MAX_LINE_BYTES`] is discarded together with the
/// message it belongs to.
#[derive(Debug)]
pub struct SseDecoder {
    pending: Vec<u8>,
    data: Vec<String>,
    event: String,
    max_line: usize,
    /// Skipping the tail of an oversized line up to its newline
    discarding: bool,
    dropped_lines: u64,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            pending: Vec::new(),
            data: Vec::new(),
            event: String::new(),
            max_line: max_line.max(1),
            discarding: false,
            dropped_lines: 0,
        }
    }

    /// Oversized lines dropped so far.
    pub fn dropped_lines(&self) -> u64 {
        self.dropped_lines
    }

    /// Feed a chunk, returning every payload it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.pending.iter().position(|byte| *byte == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            if self.discarding {
                self.discarding = false;
                continue;
            }
            if line.len() > self.max_line + 1 {
                self.drop_message();
                continue;
            }
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(payload) = self.process_line(&line) {
                payloads.push(payload);
            }
        }

        if self.pending.len() > self.max_line {
            self.pending.clear();
            if !self.discarding {
                self.discarding = true;
                self.drop_message();
            }
        }
        payloads
    }

    fn drop_message(&mut self) {
        self.dropped_lines += 1;
        self.data.clear();
        self.event.clear();
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = value.to_string(),
            // id / retry: reconnection is driven by StatusStream's own backoff
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        let event = std::mem::take(&mut self.event);
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();

        if event.is_empty() || event == "message" {
            Some(payload)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: {\"mode\":1}\n\n");
        assert_eq!(payloads, vec!["{\"mode\":1}".to_string()]);
    }

    #[test]
    fn test_split_across_chunks_and_crlf() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"fa").is_empty());
        assert!(decoder.push(b"ult\":0}\r\n").is_empty());
        let payloads = decoder.push(b"\r\ndata: {}\r\n\r\n");
        assert_eq!(payloads, vec!["{\"fault\":0}".to_string(), "{}".to_string()]);
    }

    #[test]
    fn test_multiline_data_and_comments() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b": keepalive\ndata: {\ndata: \"mode\": 2}\n\n");
        assert_eq!(payloads, vec!["{\n\"mode\": 2}".to_string()]);
    }

    #[test]
    fn test_named_events_are_dropped() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"event: error\ndata: \"boom\"\n\nevent: message\ndata: 1\n\n");
        assert_eq!(payloads, vec!["1".to_string()]);
    }

    #[test]
    fn test_unterminated_line_is_capped() {
        let mut decoder = SseDecoder::with_max_line(16);
        assert!(decoder.push(b"data: 0123456789").is_empty());
        assert!(decoder.push(b"0123456789").is_empty());
        assert_eq!(decoder.dropped_lines(), 1);
        assert!(decoder.pending.is_empty());

        // rest of the oversized line keeps being skipped
        assert!(decoder.push(b"abcdefghijklmnopqrstuvwxyz").is_empty());
        assert_eq!(decoder.dropped_lines(), 1);

        let payloads = decoder.push(b"tail\n\ndata: {}\n\n");
        assert_eq!(payloads, vec!["{}".to_string()]);
        assert_eq!(decoder.dropped_lines(), 1);
    }

    #[test]
    fn test_oversized_complete_line_drops_message() {
        let mut decoder = SseDecoder::with_max_line(8);
        let payloads = decoder.push(b"data: 1\ndata: 0123456789\n\ndata: 2\n\n");
        assert_eq!(payloads, vec!["2".to_string()]);
        assert_eq!(decoder.dropped_lines(), 1);
    }

    #[test]
    fn test_blank_lines_without_data() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"\n\nid: 4\n\n").is_empty());
    }
}
