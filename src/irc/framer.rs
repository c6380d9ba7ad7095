//! CR LF line framing for the IRC wire protocol.
//!
//! Inbound bytes are buffered until a full `\r\n`-terminated line has
//! arrived; the terminator may be split across reads. Outbound lines get the
//! terminator appended and must not carry one of their own.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::error::FramingError;

pub const TERMINATOR: &[u8] = b"\r\n";

/// Maximum line length including the terminator (RFC 1459).
pub const MAX_LINE_LEN: usize = 512;

#[derive(Debug, Clone)]
pub struct LineFramer {
    /// Offset into the pending buffer where the next terminator scan starts.
    next_index: usize,
    max_len: usize,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::with_max_len(MAX_LINE_LEN)
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }

    /// Check an outgoing line without encoding it.
    pub fn validate_outgoing(&self, line: &str) -> Result<(), FramingError> {
        if line.contains(['\r', '\n']) {
            return Err(FramingError::EmbeddedTerminator);
        }
        let actual = line.len() + TERMINATOR.len();
        if actual > self.max_len {
            return Err(FramingError::LineTooLong {
                actual,
                limit: self.max_len,
            });
        }
        Ok(())
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineFramer {
    type Item = String;
    type Error = FramingError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, FramingError> {
        let found = src[self.next_index..]
            .windows(TERMINATOR.len())
            .position(|w| w == TERMINATOR);

        match found {
            Some(offset) => {
                let end = self.next_index + offset;
                self.next_index = 0;

                let actual = end + TERMINATOR.len();
                if actual > self.max_len {
                    src.advance(actual);
                    return Err(FramingError::LineTooLong {
                        actual,
                        limit: self.max_len,
                    });
                }

                let line = src.split_to(end);
                src.advance(TERMINATOR.len());
                Ok(Some(String::from_utf8_lossy(&line).into_owned()))
            }
            None => {
                // A trailing '\r' may be the first half of a split terminator.
                self.next_index = src.len().saturating_sub(TERMINATOR.len() - 1);

                if src.len() > self.max_len {
                    return Err(FramingError::LineTooLong {
                        actual: src.len(),
                        limit: self.max_len,
                    });
                }
                Ok(None)
            }
        }
    }
}

impl Encoder<String> for LineFramer {
    type Error = FramingError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), FramingError> {
        self.validate_outgoing(&line)?;
        dst.reserve(line.len() + TERMINATOR.len());
        dst.put_slice(line.as_bytes());
        dst.put_slice(TERMINATOR);
        Ok(())
    }
}
