/// Incremental UTF-8 decoder. Bytes of a character split across chunks are
/// held back until the rest arrives; invalid sequences decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        None => {
                            // incomplete sequence at the end of the chunk
                            self.pending = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Decodes whatever is still held back once the input has ended.
    pub fn flush(&mut self) -> String {
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }
}

/// Splits an event-stream body into `data:` payloads. Chunks may end anywhere,
/// including inside a line or inside a character. Blank lines, comments and
/// other fields are skipped, as is the `[DONE]` terminator.
#[derive(Debug, Default)]
pub struct SseFramer {
    decoder: Utf8Decoder,
    buffer: String,
}

impl SseFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one network chunk and returns the payloads completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.decoder.decode(chunk);
        self.buffer.push_str(&text);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            if let Some(payload) = data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Handles a final line that was never terminated.
    pub fn finish(&mut self) -> Vec<String> {
        let tail = self.decoder.flush();
        self.buffer.push_str(&tail);
        let rest = std::mem::take(&mut self.buffer);
        rest.lines().filter_map(data_payload).collect()
    }
}

fn data_payload(line: &str) -> Option<String> {
    let payload = line.trim().strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }
    Some(payload.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_multibyte_character_decodes_once_complete() {
        let text = "héllo 世界";
        let bytes = text.as_bytes();
        // split inside the three-byte '世'
        let cut = text.find('世').unwrap() + 1;

        let mut decoder = Utf8Decoder::new();
        let mut decoded = decoder.decode(&bytes[..cut]);
        assert!(!decoded.contains(char::REPLACEMENT_CHARACTER));
        decoded.push_str(&decoder.decode(&bytes[cut..]));
        decoded.push_str(&decoder.flush());
        assert_eq!(decoded, text);
    }

    #[test]
    fn test_byte_at_a_time_matches_unsplit() {
        let text = "data: {\"delta\":\"naïve ☃ 🚀\"}\n\n";
        let mut decoder = Utf8Decoder::new();
        let mut decoded = String::new();
        for byte in text.as_bytes() {
            decoded.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        decoded.push_str(&decoder.flush());
        assert_eq!(decoded, text);
    }

    #[test]
    fn test_invalid_bytes_are_replaced_not_dropped() {
        let mut decoder = Utf8Decoder::new();
        let decoded = decoder.decode(&[b'a', 0xff, b'b']);
        assert_eq!(decoded, "a\u{FFFD}b");
        // truncated sequence left at end of input
        assert_eq!(decoder.decode(&[0xe4, 0xb8]), "");
        assert_eq!(decoder.flush(), "\u{FFFD}");
    }

    #[test]
    fn test_frames_split_across_chunks() {
        let mut framer = SseFramer::new();
        assert!(framer.push(b"event: response.output_text.delta\nda").is_empty());
        assert!(framer.push(b"ta: {\"delta\":\"Hi\"").is_empty());
        assert_eq!(framer.push(b"}\n\ndata: {\"b\":1}\n"), vec![
            "{\"delta\":\"Hi\"}".to_string(),
            "{\"b\":1}".to_string(),
        ]);
    }

    #[test]
    fn test_skips_done_comments_and_blank_payloads() {
        let mut framer = SseFramer::new();
        let payloads = framer.push(b": keep-alive\n\nid: 7\nretry: 100\ndata:\ndata: [DONE]\n\n");
        assert!(payloads.is_empty());
    }

    #[test]
    fn test_crlf_and_missing_space_after_marker() {
        let mut framer = SseFramer::new();
        let payloads = framer.push(b"data:{\"a\":1}\r\n\r\ndata: {\"b\":2}\r\n");
        assert_eq!(payloads, vec!["{\"a\":1}".to_string(), "{\"b\":2}".to_string()]);
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut framer = SseFramer::new();
        assert!(framer.push("data: {\"t\":\"é".as_bytes()).is_empty());
        assert!(framer.push(b"\"}").is_empty());
        assert_eq!(framer.finish(), vec!["{\"t\":\"é\"}".to_string()]);
        assert!(framer.finish().is_empty());
    }
}
