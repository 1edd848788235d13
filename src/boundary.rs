use crate::constants::{BOUNDARY_PREFIX, FIELD_SEPARATOR, LF, STREAM_TERMINATOR};

/// Finds the first occurrence of `value` in `window[from..]`.
pub(crate) fn find_byte(value: u8, window: &[u8], from: usize) -> Option<usize> {
    window
        .get(from..)
        .and_then(|rest| memchr::memchr(value, rest))
        .map(|idx| from + idx)
}

/// What follows a boundary delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Marker {
    /// Another encapsulation follows.
    Encapsulation,
    /// The closing delimiter, no more parts follow.
    Terminator,
}

impl Marker {
    /// A bare `LF` directly after the delimiter is accepted as `CRLF`; some
    /// clients drop the carriage return.
    pub(crate) fn from_first(byte: u8) -> Option<Marker> {
        if byte == LF {
            Some(Marker::Encapsulation)
        } else {
            None
        }
    }

    pub(crate) fn from_pair(pair: [u8; 2]) -> Option<Marker> {
        if pair == STREAM_TERMINATOR {
            Some(Marker::Terminator)
        } else if pair == FIELD_SEPARATOR {
            Some(Marker::Encapsulation)
        } else {
            None
        }
    }
}

/// Holds the on-wire delimiter `CRLF--<token>` and locates it in buffer
/// windows.
///
/// While the preamble is skipped the leading `CRLF` is left out of the
/// pattern, since the first delimiter of a body may start at offset zero.
#[derive(Debug, Clone)]
pub(crate) struct BoundaryMatcher {
    delimiter: Vec<u8>,
    start: usize,
}

impl BoundaryMatcher {
    pub(crate) fn new(token: &[u8]) -> Self {
        let mut delimiter = Vec::with_capacity(BOUNDARY_PREFIX.len() + token.len());
        delimiter.extend_from_slice(&BOUNDARY_PREFIX);
        delimiter.extend_from_slice(token);

        BoundaryMatcher { delimiter, start: 0 }
    }

    /// The bytes currently searched for.
    pub(crate) fn pattern(&self) -> &[u8] {
        &self.delimiter[self.start..]
    }

    /// Length of the active pattern.
    pub(crate) fn len(&self) -> usize {
        self.delimiter.len() - self.start
    }

    /// Bytes that must stay buffered across a refill so a delimiter split
    /// between two reads is still seen.
    pub(crate) fn keep_region(&self) -> usize {
        self.delimiter.len()
    }

    pub(crate) fn token(&self) -> &[u8] {
        &self.delimiter[BOUNDARY_PREFIX.len()..]
    }

    pub(crate) fn set_token(&mut self, token: &[u8]) -> crate::Result<()> {
        let expected = self.token().len();
        if token.len() != expected {
            return Err(crate::Error::IllegalBoundary {
                expected,
                actual: token.len(),
            });
        }

        self.delimiter[BOUNDARY_PREFIX.len()..].copy_from_slice(token);
        Ok(())
    }

    pub(crate) fn enter_preamble(&mut self) {
        self.start = FIELD_SEPARATOR.len();
    }

    pub(crate) fn leave_preamble(&mut self) {
        self.start = 0;
    }

    /// Returns the start of the first complete delimiter inside `window`.
    ///
    /// `None` means the window holds no complete delimiter yet, not that the
    /// stream contains none.
    pub(crate) fn find_in(&self, window: &[u8]) -> Option<usize> {
        let pattern = self.pattern();
        let max_pos = window.len().checked_sub(pattern.len())?;

        let mut pos = 0;
        while pos <= max_pos {
            let first = find_byte(pattern[0], window, pos).filter(|&idx| idx <= max_pos)?;

            if window[first + 1..first + pattern.len()] == pattern[1..] {
                return Some(first);
            }

            pos = first + 1;
        }

        None
    }
}
