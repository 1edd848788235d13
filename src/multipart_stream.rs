use std::io::{Read, Write};

use bytes::{BufMut, Bytes, BytesMut};
use encoding_rs::{Encoding, UTF_8};

use crate::boundary::{BoundaryMatcher, Marker};
use crate::buffer::StreamBuffer;
use crate::config::Config;
use crate::constants::{self, HEADER_PART_SIZE_MAX, HEADER_SEPARATOR};
use crate::part_reader::PartReader;
use crate::progress::ProgressNotifier;

/// Low-level, pull-based decoder of a `multipart/form-data` body read from any
/// [`Read`] source.
///
/// Memory use is bounded by the working buffer: part bodies are never
/// collected, they are handed out through a [`PartReader`] which stops at the
/// next boundary.
///
/// The decoding loop looks like this:
///
/// ```
/// use std::io::Read;
/// use formpart::MultipartStream;
///
/// # fn run() -> formpart::Result<()> {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let mut stream = MultipartStream::new(data.as_bytes(), "X-BOUNDARY");
///
/// let mut next_part = stream.skip_preamble()?;
/// while next_part {
///     let headers = stream.read_headers()?;
///     let mut body = Vec::new();
///     stream.read_body_data(&mut body)?;
///
///     println!("{}{:?}", headers, body);
///     next_part = stream.read_boundary()?;
/// }
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
#[derive(Debug)]
pub struct MultipartStream<R> {
    pub(crate) buffer: StreamBuffer<R>,
    pub(crate) matcher: BoundaryMatcher,
    header_encoding: Option<&'static Encoding>,
}

impl<R: Read> MultipartStream<R> {
    /// Creates a decoder over `reader` for the given boundary token, which is
    /// the `boundary` parameter of the `Content-Type` header without the
    /// leading dashes.
    ///
    /// The working buffer holds 4096 bytes, or more if the boundary token
    /// requires it.
    pub fn new<B: AsRef<[u8]>>(reader: R, boundary: B) -> MultipartStream<R> {
        let token = boundary.as_ref();
        let buffer_size = constants::DEFAULT_BUF_SIZE.max(constants::min_buffer_size(token.len()));

        MultipartStream::build(reader, token, buffer_size, Config::default())
    }

    /// Creates a decoder with the given [`Config`].
    ///
    /// Fails with [`Error::BufferTooSmall`](crate::Error::BufferTooSmall) if
    /// the configured buffer can't hold the delimiter plus four bytes.
    pub fn with_config<B: AsRef<[u8]>>(reader: R, boundary: B, config: Config) -> crate::Result<MultipartStream<R>> {
        let token = boundary.as_ref();
        let buffer_size = config.resolve_buffer_size(token.len())?;

        Ok(MultipartStream::build(reader, token, buffer_size, config))
    }

    fn build(reader: R, token: &[u8], buffer_size: usize, config: Config) -> MultipartStream<R> {
        trace!("new multipart stream, boundary length {}, buffer size {}", token.len(), buffer_size);

        MultipartStream {
            buffer: StreamBuffer::new(reader, buffer_size, config.notifier),
            matcher: BoundaryMatcher::new(token),
            header_encoding: config.header_encoding,
        }
    }

    /// The encoding used to decode header blocks, `None` meaning UTF-8.
    pub fn header_encoding(&self) -> Option<&'static Encoding> {
        self.header_encoding
    }

    /// Sets the encoding of later header blocks, `None` meaning UTF-8.
    pub fn set_header_encoding(&mut self, encoding: Option<&'static Encoding>) {
        self.header_encoding = encoding;
    }

    /// Capacity of the working buffer.
    pub fn buffer_size(&self) -> usize {
        self.buffer.capacity()
    }

    /// The progress counters of this stream.
    pub fn progress(&self) -> &ProgressNotifier {
        &self.buffer.notifier
    }

    /// The active boundary token.
    pub fn boundary(&self) -> &[u8] {
        self.matcher.token()
    }

    /// Returns the underlying reader, or `None` once a part reader aborted the
    /// stream.
    pub fn get_mut(&mut self) -> Option<&mut R> {
        self.buffer.source_mut()
    }

    /// Consumes the decoder and returns the underlying reader. Buffered bytes
    /// are lost.
    pub fn into_inner(self) -> Option<R> {
        self.buffer.into_source()
    }

    /// Reads the next byte, refilling the working buffer when it is drained.
    ///
    /// The end of the source is a [`MalformedStream`](crate::Error::MalformedStream)
    /// error.
    pub fn read_byte(&mut self) -> crate::Result<u8> {
        self.buffer.read_byte()
    }

    /// Absolute buffer index of the first complete delimiter after `head`.
    pub(crate) fn find_separator(&self) -> Option<usize> {
        self.matcher
            .find_in(self.buffer.window())
            .map(|idx| self.buffer.head() + idx)
    }

    /// Discards everything before the first delimiter.
    ///
    /// Returns `true` if the stream contains an encapsulation, `false` if it
    /// ends or is malformed before one is found.
    pub fn skip_preamble(&mut self) -> crate::Result<bool> {
        self.matcher.enter_preamble();

        let result = self.discard_body_data().and_then(|skipped| {
            trace!("skipped {} bytes of preamble", skipped);
            self.read_boundary()
        });

        self.matcher.leave_preamble();

        match result {
            Err(err) if err.is_malformed() => {
                debug!("no encapsulation found: {}", err);
                Ok(false)
            }
            result => result,
        }
    }

    /// Steps over the delimiter at the current position and the two bytes
    /// after it.
    ///
    /// Returns `true` if another part follows (`CRLF`, or a lone `LF`) and
    /// `false` after the stream terminator (`--`).
    pub fn read_boundary(&mut self) -> crate::Result<bool> {
        self.skip_delimiter()?;

        match self.read_marker()? {
            Marker::Encapsulation => {
                self.buffer.notifier.note_item();
                trace!("boundary found, part {} follows", self.buffer.notifier.items());
                Ok(true)
            }
            Marker::Terminator => {
                trace!("stream terminator found");
                Ok(false)
            }
        }
    }

    fn skip_delimiter(&mut self) -> crate::Result<()> {
        let len = self.matcher.len();
        let buffered = len.min(self.buffer.len());
        self.buffer.consume(buffered);

        for _ in buffered..len {
            self.read_byte_in_protocol()?;
        }

        Ok(())
    }

    fn read_marker(&mut self) -> crate::Result<Marker> {
        let first = self.read_byte_in_protocol()?;
        if let Some(marker) = Marker::from_first(first) {
            return Ok(marker);
        }

        let second = self.read_byte_in_protocol()?;
        Marker::from_pair([first, second]).ok_or_else(|| {
            debug!("unexpected boundary trailer {:?}", [first, second]);
            crate::Error::malformed("unexpected characters follow a boundary")
        })
    }

    fn read_byte_in_protocol(&mut self) -> crate::Result<u8> {
        self.read_byte()
            .map_err(|err| crate::Error::malformed_with("stream ended unexpectedly", err))
    }

    /// Swaps the boundary token, e.g. to decode a nested `multipart/mixed`
    /// body in the same pass.
    ///
    /// The new token must have the length of the current one, otherwise
    /// [`Error::IllegalBoundary`](crate::Error::IllegalBoundary) is returned
    /// and the token is unchanged.
    pub fn set_boundary<B: AsRef<[u8]>>(&mut self, boundary: B) -> crate::Result<()> {
        self.matcher.set_token(boundary.as_ref())
    }

    /// Reads the raw header block of the current part, `CRLFCRLF` terminator
    /// included.
    pub fn read_header_bytes(&mut self) -> crate::Result<Bytes> {
        let mut headers = BytesMut::with_capacity(256);
        let mut matched = 0;

        while matched < HEADER_SEPARATOR.len() {
            let byte = self.read_byte_in_protocol()?;

            if headers.len() == HEADER_PART_SIZE_MAX {
                debug!("header block exceeds {} bytes", HEADER_PART_SIZE_MAX);
                return Err(crate::Error::malformed(format!(
                    "header section has more than {} bytes (maybe it is not properly terminated)",
                    HEADER_PART_SIZE_MAX
                )));
            }

            // A mismatch restarts the match from scratch, even on CR.
            matched = if byte == HEADER_SEPARATOR[matched] { matched + 1 } else { 0 };

            headers.put_u8(byte);
        }

        Ok(headers.freeze())
    }

    /// Reads the header block of the current part and decodes it with the
    /// configured header encoding.
    pub fn read_headers(&mut self) -> crate::Result<String> {
        let raw = self.read_header_bytes()?;
        Ok(self.decode_header_text(&raw))
    }

    pub(crate) fn decode_header_text(&self, raw: &[u8]) -> String {
        let encoding = self.header_encoding.unwrap_or(UTF_8);
        let (text, _) = encoding.decode_without_bom_handling(raw);
        text.into_owned()
    }

    /// Returns a reader over the body of the current part.
    pub fn part_reader(&mut self) -> PartReader<'_, R> {
        PartReader::new(self)
    }

    /// Copies the body of the current part into `output` and returns the
    /// number of bytes written.
    pub fn read_body_data<W: Write + ?Sized>(&mut self, output: &mut W) -> crate::Result<u64> {
        let mut part = self.part_reader();
        let written = part.write_to(output)?;
        part.close()?;
        Ok(written)
    }

    /// Skips the body of the current part and returns the number of bytes
    /// skipped.
    pub fn discard_body_data(&mut self) -> crate::Result<u64> {
        let mut part = self.part_reader();
        let skipped = part.drain()?;
        part.close()?;
        Ok(skipped)
    }
}
