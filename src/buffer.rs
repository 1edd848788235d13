use std::io::{self, Read};

use crate::progress::ProgressNotifier;

/// Fixed-capacity working buffer over a byte source.
///
/// Valid data lives in `buf[head..tail]`, with `head <= tail <= buf.len()`
/// at all times.
#[derive(Debug)]
pub(crate) struct StreamBuffer<R> {
    reader: Option<R>,
    buf: Box<[u8]>,
    head: usize,
    tail: usize,
    pub(crate) notifier: ProgressNotifier,
}

impl<R: Read> StreamBuffer<R> {
    pub(crate) fn new(reader: R, capacity: usize, notifier: ProgressNotifier) -> Self {
        StreamBuffer {
            reader: Some(reader),
            buf: vec![0; capacity].into_boxed_slice(),
            head: 0,
            tail: 0,
            notifier,
        }
    }

    fn check_cursors(&self) {
        debug_assert!(self.head <= self.tail, "head {} past tail {}", self.head, self.tail);
        debug_assert!(self.tail <= self.buf.len(), "tail {} past capacity {}", self.tail, self.buf.len());
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// The buffered, not yet consumed bytes.
    pub(crate) fn window(&self) -> &[u8] {
        &self.buf[self.head..self.tail]
    }

    pub(crate) fn head(&self) -> usize {
        self.head
    }

    pub(crate) fn len(&self) -> usize {
        self.tail - self.head
    }

    /// Marks `n` buffered bytes as consumed.
    pub(crate) fn consume(&mut self, n: usize) {
        self.head += n;
        self.check_cursors();
    }

    /// Consumes `n` buffered bytes and returns them.
    pub(crate) fn take(&mut self, n: usize) -> &[u8] {
        let start = self.head;
        self.consume(n);
        &self.buf[start..start + n]
    }

    /// Reads once from the source into the free space after `tail`.
    ///
    /// Returns the number of bytes obtained, `0` meaning end of source.
    pub(crate) fn fill(&mut self) -> crate::Result<usize> {
        let reader = self.reader.as_mut().ok_or_else(|| {
            crate::Error::StreamReadFailed(io::Error::new(
                io::ErrorKind::NotConnected,
                "multipart source was closed",
            ))
        })?;

        let spare = &mut self.buf[self.tail..];
        debug_assert!(!spare.is_empty(), "refill into a full buffer");

        let n = loop {
            match reader.read(spare) {
                Ok(n) => break n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(crate::Error::StreamReadFailed(err)),
            }
        };

        if n > 0 {
            self.tail += n;
            self.check_cursors();
            self.notifier.note_bytes_read(n);
            trace!("buffer refilled with {} bytes, {} buffered", n, self.len());
        }

        Ok(n)
    }

    /// Returns the next byte, refilling the whole buffer once it is drained.
    pub(crate) fn read_byte(&mut self) -> crate::Result<u8> {
        if self.head == self.tail {
            self.head = 0;
            self.tail = 0;

            if self.fill()? == 0 {
                return Err(crate::Error::malformed("no more data is available"));
            }
        }

        let byte = self.buf[self.head];
        self.head += 1;
        Ok(byte)
    }

    /// Moves the last `keep` buffered bytes to the front of the buffer and
    /// drops everything before them.
    pub(crate) fn compact(&mut self, keep: usize) {
        debug_assert!(keep <= self.len());

        let from = self.tail - keep;
        self.buf.copy_within(from..self.tail, 0);
        self.head = 0;
        self.tail = keep;
        self.check_cursors();
    }

    /// Drops the underlying source together with the buffered bytes. Every
    /// later read fails with an I/O error.
    pub(crate) fn close_source(&mut self) {
        if self.reader.take().is_some() {
            debug!("multipart source closed, {} buffered bytes dropped", self.len());
        }

        self.head = 0;
        self.tail = 0;
    }

    pub(crate) fn source_mut(&mut self) -> Option<&mut R> {
        self.reader.as_mut()
    }

    pub(crate) fn into_source(self) -> Option<R> {
        self.reader
    }
}
