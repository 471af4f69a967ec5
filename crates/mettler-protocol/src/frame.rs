//! CR/LF line framing.
//!
//! Commands and responses are single ASCII lines terminated by `<CR><LF>`.
//! [`LineCodec`] implements the `tokio-util` [`Decoder`] and [`Encoder`]
//! traits over a [`BytesMut`] buffer, so the same framing serves the blocking
//! serial transport (which feeds the buffer by hand) and any `Framed` stream.
//!
//! ```text
//! bytes in:   53 20 20 31 38 2E 35 20 67 0D 0A
//!             S  ␠  ␠  1  8  .  5  ␠  g  CR LF
//! line out:   "S  18.5 g"
//! ```
//!
//! Only the terminator is stripped; anything else on the line is handed to
//! the parser exactly as the balance sent it. Bytes that are not valid UTF-8
//! are replaced with `U+FFFD`, leaving the parser to reject the line.
//!
//! # DoS Protection
//!
//! A line longer than the configured maximum (default 256 bytes) is rejected
//! instead of buffering without bound. Real balance responses are well under
//! 64 bytes.

use bytes::{BufMut, BytesMut};
use mettler_core::constants::{CR, LF, LINE_TERMINATOR};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// Default maximum line length in bytes, terminator excluded.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 256;

/// Codec for terminator-delimited ASCII lines.
#[derive(Debug, Clone)]
pub struct LineCodec {
    /// Lines longer than this are rejected.
    max_line_length: usize,
}

impl LineCodec {
    /// Create a codec with the default maximum line length.
    pub fn new() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Create a codec with a custom maximum line length.
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self { max_line_length }
    }

    /// Get the current maximum line length.
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    fn check_length(&self, len: usize) -> io::Result<()> {
        if len > self.max_line_length {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "line of {len} bytes exceeds maximum of {} bytes",
                    self.max_line_length
                ),
            ));
        }
        Ok(())
    }

    fn into_line(mut bytes: BytesMut) -> String {
        if bytes.last() == Some(&CR) {
            bytes.truncate(bytes.len() - 1);
        }

        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = io::Error;

    /// Extract one complete line from `src`.
    ///
    /// Returns `Ok(None)` until a line feed has been buffered. A bare `LF`
    /// terminates a line as well; a preceding `CR` is dropped with it.
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use tokio_util::codec::Decoder;
    /// use mettler_protocol::LineCodec;
    ///
    /// let mut codec = LineCodec::new();
    /// let mut buffer = BytesMut::from(&b"S  18.5 g\r\nS  18.6 g"[..]);
    ///
    /// assert_eq!(codec.decode(&mut buffer).unwrap(), Some("S  18.5 g".to_string()));
    /// assert_eq!(codec.decode(&mut buffer).unwrap(), None);
    /// ```
    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<String>> {
        let Some(position) = src.iter().position(|byte| *byte == LF) else {
            self.check_length(src.len())?;
            return Ok(None);
        };

        let mut line = src.split_to(position + 1);
        line.truncate(position);
        self.check_length(line.len())?;

        Ok(Some(Self::into_line(line)))
    }

    /// Like [`decode`](Self::decode), but hands back an unterminated
    /// remainder as a final line instead of discarding it.
    fn decode_eof(&mut self, src: &mut BytesMut) -> io::Result<Option<String>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }

        if src.is_empty() {
            return Ok(None);
        }

        let rest = src.split();
        Ok(Some(Self::into_line(rest)))
    }
}

impl Encoder<&str> for LineCodec {
    type Error = io::Error;

    /// Append `command` and the line terminator to `dst`.
    ///
    /// # Errors
    ///
    /// Rejects commands that already contain `CR` or `LF`.
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use tokio_util::codec::Encoder;
    /// use mettler_protocol::LineCodec;
    ///
    /// let mut buffer = BytesMut::new();
    /// LineCodec::new().encode("SI", &mut buffer).unwrap();
    /// assert_eq!(&buffer[..], b"SI\r\n");
    /// ```
    fn encode(&mut self, command: &str, dst: &mut BytesMut) -> io::Result<()> {
        if command.bytes().any(|byte| byte == CR || byte == LF) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "command must not contain line terminators",
            ));
        }
        self.check_length(command.len())?;

        dst.reserve(command.len() + LINE_TERMINATOR.len());
        dst.put_slice(command.as_bytes());
        dst.put_slice(LINE_TERMINATOR);
        Ok(())
    }
}
