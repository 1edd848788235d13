use std::convert::TryFrom;
use std::io::{self, BufRead, Read, Write};

use bytes::Bytes;

use crate::multipart_stream::MultipartStream;

/// A single-pass reader over the body of one part.
///
/// It reads straight out of the parent stream's working buffer and refills
/// it on demand, but never past the next boundary delimiter. While no
/// delimiter is in sight, the trailing `pad` bytes of the buffer are held back
/// since they may be the beginning of one.
///
/// Once closed, every read or skip fails with
/// [`Error::PartAlreadyConsumed`](crate::Error::PartAlreadyConsumed).
///
/// Dropping the reader doesn't consume the rest of the body: call
/// [`close`](PartReader::close) before reading the next boundary.
#[derive(Debug)]
pub struct PartReader<'a, R> {
    stream: &'a mut MultipartStream<R>,
    separator: Option<usize>,
    pad: usize,
    total: u64,
    closed: bool,
}

impl<'a, R: Read> PartReader<'a, R> {
    pub(crate) fn new(stream: &'a mut MultipartStream<R>) -> Self {
        let mut reader = PartReader {
            stream,
            separator: None,
            pad: 0,
            total: 0,
            closed: false,
        };
        reader.find_separator();
        reader
    }

    fn find_separator(&mut self) {
        self.separator = self.stream.find_separator();

        if self.separator.is_none() {
            self.pad = self.stream.buffer.len().min(self.stream.matcher.keep_region());
        }
    }

    /// Number of body bytes that can be read without touching the source.
    pub fn available(&self) -> usize {
        match self.separator {
            Some(pos) => pos - self.stream.buffer.head(),
            None => self.stream.buffer.len() - self.pad,
        }
    }

    fn make_available(&mut self) -> crate::Result<usize> {
        if self.separator.is_some() {
            return Ok(0);
        }

        self.stream.buffer.compact(self.pad);

        loop {
            if self.stream.buffer.fill()? == 0 {
                debug!("source ended inside a part body");
                return Err(crate::Error::malformed("stream ended unexpectedly"));
            }

            self.find_separator();
            let available = self.available();

            if available > 0 || self.separator.is_some() {
                return Ok(available);
            }
        }
    }

    fn check_open(&self) -> crate::Result<()> {
        if self.closed {
            Err(crate::Error::PartAlreadyConsumed)
        } else {
            Ok(())
        }
    }

    /// Consumes and returns up to `max` body bytes. An empty slice marks the
    /// end of the body.
    fn next_chunk(&mut self, max: usize) -> crate::Result<&[u8]> {
        self.check_open()?;

        let mut available = self.available();
        if available == 0 {
            available = self.make_available()?;
        }

        Ok(self.stream.buffer.take(available.min(max)))
    }

    /// Reads body bytes into `buf`, returning `0` at the end of the body.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> crate::Result<usize> {
        if buf.is_empty() {
            return self.check_open().map(|_| 0);
        }

        let chunk = self.next_chunk(buf.len())?;
        let n = chunk.len();
        buf[..n].copy_from_slice(chunk);

        self.total += n as u64;
        Ok(n)
    }

    /// Reads the next chunk of the body, as much as is buffered.
    pub fn read_chunk(&mut self) -> crate::Result<Option<Bytes>> {
        let chunk = self.next_chunk(usize::MAX)?;
        if chunk.is_empty() {
            return Ok(None);
        }

        let chunk = Bytes::copy_from_slice(chunk);
        self.total += chunk.len() as u64;
        Ok(Some(chunk))
    }

    /// Skips up to `n` body bytes and returns how many were skipped, `0` at
    /// the end of the body.
    pub fn skip(&mut self, n: u64) -> crate::Result<u64> {
        let max = usize::try_from(n).unwrap_or(usize::MAX);
        self.next_chunk(max).map(|chunk| chunk.len() as u64)
    }

    pub(crate) fn drain(&mut self) -> crate::Result<u64> {
        let mut skipped = 0;

        loop {
            let n = self.next_chunk(usize::MAX)?.len();
            if n == 0 {
                return Ok(skipped);
            }
            skipped += n as u64;
        }
    }

    pub(crate) fn write_to<W: Write + ?Sized>(&mut self, output: &mut W) -> crate::Result<u64> {
        let mut written = 0;

        loop {
            let chunk = self.next_chunk(usize::MAX)?;
            if chunk.is_empty() {
                return Ok(written);
            }

            let n = chunk.len() as u64;
            output.write_all(chunk).map_err(crate::Error::StreamWriteFailed)?;

            written += n;
            self.total += n;
        }
    }

    /// Skips the rest of the body so the parent stream is positioned at the
    /// next boundary, then marks the reader as closed. The source stays open.
    pub fn close(&mut self) -> crate::Result<()> {
        if self.closed {
            return Ok(());
        }

        self.drain()?;
        self.closed = true;
        Ok(())
    }

    /// Closes the reader together with the underlying source, abandoning the
    /// rest of the request. Buffered bytes are dropped as well, so every later
    /// read of the parent stream fails.
    pub fn abort(&mut self) {
        if self.closed {
            return;
        }

        self.closed = true;
        self.separator = None;
        self.pad = 0;
        self.stream.buffer.close_source();
    }

    /// Whether `close` or `abort` was called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of body bytes handed out by this reader so far.
    pub fn bytes_read(&self) -> u64 {
        self.total
    }
}

impl<'a, R: Read> Read for PartReader<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_bytes(buf).map_err(Into::into)
    }
}

impl<'a, R: Read> BufRead for PartReader<'a, R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.check_open()?;

        let mut available = self.available();
        if available == 0 {
            available = self.make_available()?;
        }

        Ok(&self.stream.buffer.window()[..available])
    }

    fn consume(&mut self, amt: usize) {
        if self.closed {
            return;
        }

        let amt = amt.min(self.available());
        self.stream.buffer.consume(amt);
        self.total += amt as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const BODY: &str = "--B\r\nX: y\r\n\r\nsome body text\r\n--B--\r\n";

    fn positioned(data: &'static str, buffer_size: usize) -> MultipartStream<Cursor<&'static [u8]>> {
        let config = crate::Config::new().buffer_size(buffer_size);
        let mut stream = MultipartStream::with_config(Cursor::new(data.as_bytes()), "B", config).unwrap();

        assert_eq!(stream.skip_preamble(), Ok(true));
        stream.read_headers().unwrap();
        stream
    }

    #[test]
    fn test_available_holds_back_pad() {
        let mut stream = positioned(BODY, 20);
        let part = stream.part_reader();

        // Only "some bo" is buffered after the headers.
        assert_eq!(part.separator, None);
        assert_eq!(part.pad, 5);
        assert_eq!(part.available(), 2);
    }

    #[test]
    fn test_read_stops_at_boundary() {
        let mut stream = positioned(BODY, 9);
        let mut part = stream.part_reader();

        let mut body = Vec::new();
        let mut buf = [0; 3];
        loop {
            let n = part.read_bytes(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            body.extend_from_slice(&buf[..n]);
        }

        assert_eq!(body, b"some body text");
        assert_eq!(part.bytes_read(), 14);
        assert_eq!(part.read_bytes(&mut buf), Ok(0));

        part.close().unwrap();
        assert_eq!(stream.read_boundary(), Ok(false));
    }

    #[test]
    fn test_closed_part_rejects_reads() {
        let mut stream = positioned(BODY, 64);
        let mut part = stream.part_reader();

        part.close().unwrap();
        assert!(part.is_closed());
        assert_eq!(part.close(), Ok(()));

        let mut buf = [0; 4];
        assert_eq!(part.read_bytes(&mut buf), Err(crate::Error::PartAlreadyConsumed));
        assert_eq!(part.read_bytes(&mut []), Err(crate::Error::PartAlreadyConsumed));
        assert_eq!(part.skip(4), Err(crate::Error::PartAlreadyConsumed));
        assert_eq!(part.read_chunk(), Err(crate::Error::PartAlreadyConsumed));

        let err = part.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert_eq!(err.to_string(), "part has already been consumed");
    }

    #[test]
    fn test_skip_and_chunks() {
        let mut stream = positioned(BODY, 64);
        let mut part = stream.part_reader();

        assert_eq!(part.skip(5), Ok(5));
        assert_eq!(part.read_chunk(), Ok(Some(Bytes::from_static(b"body text"))));
        assert_eq!(part.read_chunk(), Ok(None));
        assert_eq!(part.skip(5), Ok(0));
    }

    #[test]
    fn test_buf_read() {
        let mut stream = positioned("--B\r\nX: y\r\n\r\nline one\nline two\r\n--B--", 12);
        let part = stream.part_reader();

        let lines: Vec<String> = part.lines().map(|line| line.unwrap()).collect();
        assert_eq!(lines, vec!["line one", "line two"]);
    }

    #[test]
    fn test_consume_after_close_keeps_position() {
        let mut stream = positioned(BODY, 64);
        let mut part = stream.part_reader();

        part.close().unwrap();
        let head = part.stream.buffer.head();

        part.consume(3);
        assert_eq!(part.stream.buffer.head(), head);
        assert_eq!(part.bytes_read(), 0);

        assert_eq!(stream.read_boundary(), Ok(false));
    }

    #[test]
    fn test_consume_after_abort_is_ignored() {
        let mut stream = positioned(BODY, 64);
        let mut part = stream.part_reader();
        assert_eq!(part.available(), 14);

        part.abort();
        assert_eq!(part.available(), 0);

        part.consume(3);
        assert_eq!(part.bytes_read(), 0);
        assert!(part.fill_buf().is_err());
    }

    #[test]
    fn test_abort_closes_source() {
        let mut stream = positioned(BODY, 9);

        let mut part = stream.part_reader();
        part.abort();
        assert!(part.is_closed());
        assert_eq!(part.skip(1), Err(crate::Error::PartAlreadyConsumed));

        assert!(stream.get_mut().is_none());
        match stream.discard_body_data() {
            Err(crate::Error::StreamReadFailed(err)) => assert_eq!(err.kind(), io::ErrorKind::NotConnected),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
