//! Protocol constants and line framing shared by the word server and its clients.
//!
//! The wire protocol is plain text: every message is a line terminated by
//! [`NETWORK_NEWLINE`]. Incoming lines may end in either `\r\n` or a bare `\n`.

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 59994;
pub const DEFAULT_BACKLOG: u32 = 5;
pub const DEFAULT_MAX_MISSES: u32 = 4;
pub const MAX_LINE_LEN: usize = 256;
pub const MAX_NAME_LEN: usize = 30;

/// Terminator appended to every outbound message.
pub const NETWORK_NEWLINE: &str = "\r\n";

/// Shown in the word mask for letters nobody has guessed yet.
pub const HIDDEN_LETTER: char = '-';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("line exceeds {max} bytes")]
    TooLong { max: usize },
}

/// Bounded accumulation buffer that turns a byte stream into lines.
///
/// Bytes are appended as they arrive from the socket, which means a line (or
/// its `\r\n` delimiter) may be split across any number of reads. Complete
/// lines are taken out one at a time with [`LineBuffer::next_line`].
#[derive(Debug)]
pub struct LineBuffer {
    buf: Vec<u8>,
    max_len: usize,
}

impl LineBuffer {
    /// Creates an empty buffer accepting lines of at most `max_len` bytes
    /// (delimiter excluded).
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: Vec::with_capacity(max_len.min(MAX_LINE_LEN) + 2),
            max_len,
        }
    }

    /// Appends freshly read bytes.
    ///
    /// Fails once the buffered, still unterminated input can no longer fit in
    /// a single line. The buffer contents are unspecified after an error and
    /// the connection is expected to be dropped.
    pub fn push(&mut self, data: &[u8]) -> Result<(), LineError> {
        self.buf.extend_from_slice(data);
        if !self.has_line() && self.buf.len() > self.max_len + 1 {
            // One extra byte leaves room for a '\r' waiting on its '\n'.
            return Err(LineError::TooLong { max: self.max_len });
        }
        Ok(())
    }

    /// True if at least one delimiter-terminated line is buffered.
    pub fn has_line(&self) -> bool {
        self.buf.contains(&b'\n')
    }

    /// Removes and returns the next complete line without its delimiter.
    ///
    /// Returns `Ok(None)` when more input is needed. Invalid UTF-8 is replaced
    /// rather than rejected.
    pub fn next_line(&mut self) -> Result<Option<String>, LineError> {
        let Some(newline) = self.buf.iter().position(|&b| b == b'\n') else {
            if self.buf.len() > self.max_len + 1 {
                return Err(LineError::TooLong { max: self.max_len });
            }
            return Ok(None);
        };

        let mut end = newline;
        if end > 0 && self.buf[end - 1] == b'\r' {
            end -= 1;
        }
        if end > self.max_len {
            return Err(LineError::TooLong { max: self.max_len });
        }

        let line = String::from_utf8_lossy(&self.buf[..end]).into_owned();
        self.buf.drain(..=newline);
        Ok(Some(line))
    }

    /// Number of bytes currently buffered.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Appends the protocol line terminator to `text`.
pub fn frame(text: &str) -> String {
    let mut line = String::with_capacity(text.len() + NETWORK_NEWLINE.len());
    line.push_str(text);
    line.push_str(NETWORK_NEWLINE);
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let mut buffer = LineBuffer::new(16);
        buffer.push(b"alice\r\n").unwrap();

        assert!(buffer.has_line());
        assert_eq!(buffer.next_line().unwrap(), Some("alice".to_string()));
        assert_eq!(buffer.next_line().unwrap(), None);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_line_split_across_reads() {
        let mut buffer = LineBuffer::new(16);
        buffer.push(b"al").unwrap();
        assert_eq!(buffer.next_line().unwrap(), None);

        buffer.push(b"ice\r").unwrap();
        assert_eq!(buffer.next_line().unwrap(), None);

        buffer.push(b"\n").unwrap();
        assert_eq!(buffer.next_line().unwrap(), Some("alice".to_string()));
    }

    #[test]
    fn test_bare_newline_and_multiple_lines() {
        let mut buffer = LineBuffer::new(16);
        buffer.push(b"a\nb\r\nc").unwrap();

        assert_eq!(buffer.next_line().unwrap(), Some("a".to_string()));
        assert_eq!(buffer.next_line().unwrap(), Some("b".to_string()));
        assert_eq!(buffer.next_line().unwrap(), None);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_empty_line() {
        let mut buffer = LineBuffer::new(16);
        buffer.push(b"\r\n").unwrap();
        assert_eq!(buffer.next_line().unwrap(), Some(String::new()));
    }

    #[test]
    fn test_overflow_without_delimiter() {
        let mut buffer = LineBuffer::new(4);
        assert!(buffer.push(b"abcd").is_ok());
        assert!(buffer.push(b"\r").is_ok());
        assert_eq!(buffer.push(b"x"), Err(LineError::TooLong { max: 4 }));
    }

    #[test]
    fn test_overflow_after_complete_line() {
        let mut buffer = LineBuffer::new(4);
        buffer.push(b"a\nbcdefgh").unwrap();

        assert_eq!(buffer.next_line().unwrap(), Some("a".to_string()));
        assert_eq!(buffer.next_line(), Err(LineError::TooLong { max: 4 }));
    }

    #[test]
    fn test_exact_limit_is_accepted() {
        let mut buffer = LineBuffer::new(4);
        buffer.push(b"abcd\r\n").unwrap();
        assert_eq!(buffer.next_line().unwrap(), Some("abcd".to_string()));
    }

    #[test]
    fn test_overlong_terminated_line_is_rejected() {
        let mut buffer = LineBuffer::new(4);
        buffer.push(b"abcdef\n").unwrap();
        assert_eq!(buffer.next_line(), Err(LineError::TooLong { max: 4 }));
    }

    #[test]
    fn test_frame_appends_terminator() {
        assert_eq!(frame("hello"), "hello\r\n");
    }
}
