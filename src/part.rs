use std::borrow::Cow;
use std::io::{self, BufRead, Read, Write};

use bytes::{Bytes, BytesMut};
use encoding_rs::{Encoding, UTF_8};
use http::header::{self, HeaderMap};
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;

use crate::content_disposition::ContentDisposition;
use crate::part_reader::PartReader;

/// A single part of a multipart stream: a form field or an uploaded file.
///
/// The body is read lazily from the underlying stream, through the
/// [`Read`]/[`BufRead`] implementations or the helpers below. A part borrows
/// its [`Multipart`](crate::Multipart), so only one part is alive at a time;
/// whatever is left unread is skipped when the next part is requested.
///
/// # Examples
///
/// ```
/// use formpart::Multipart;
///
/// # fn run() -> formpart::Result<()> {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let mut multipart = Multipart::new(data.as_bytes(), "X-BOUNDARY");
///
/// while let Some(part) = multipart.next_part()? {
///     assert_eq!(part.name(), Some("my_text_field"));
///     assert_eq!(part.text()?, "abcd");
/// }
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
#[derive(Debug)]
pub struct Part<'a, R> {
    reader: PartReader<'a, R>,
    headers: HeaderMap,
    meta: PartMeta,
}

#[derive(Debug)]
struct PartMeta {
    name: Option<String>,
    file_name: Option<String>,
    content_type: Option<mime::Mime>,
    idx: usize,
}

impl<'a, R: Read> Part<'a, R> {
    pub(crate) fn new(
        reader: PartReader<'a, R>,
        headers: HeaderMap,
        idx: usize,
        content_disposition: ContentDisposition,
    ) -> Self {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<mime::Mime>().ok());

        Part {
            reader,
            headers,
            meta: PartMeta {
                name: content_disposition.field_name,
                file_name: content_disposition.file_name,
                content_type,
                idx,
            },
        }
    }

    /// The field name from the `Content-Disposition` header.
    pub fn name(&self) -> Option<&str> {
        self.meta.name.as_deref()
    }

    /// The file name from the `Content-Disposition` header. An empty name
    /// means a file input was submitted without a file.
    pub fn file_name(&self) -> Option<&str> {
        self.meta.file_name.as_deref()
    }

    /// The parsed `Content-Type` header, if present and valid.
    pub fn content_type(&self) -> Option<&mime::Mime> {
        self.meta.content_type.as_ref()
    }

    /// All headers of the part.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Position of the part in the stream, starting at zero.
    pub fn index(&self) -> usize {
        self.meta.idx
    }

    /// Number of body bytes read so far.
    pub fn bytes_read(&self) -> u64 {
        self.reader.bytes_read()
    }

    /// Reads the next buffered chunk of the body, `None` at its end.
    pub fn chunk(&mut self) -> crate::Result<Option<Bytes>> {
        self.reader.read_chunk()
    }

    /// Reads the whole body into memory.
    pub fn bytes(mut self) -> crate::Result<Bytes> {
        let mut buf = BytesMut::new();

        while let Some(bytes) = self.chunk()? {
            buf.extend_from_slice(&bytes);
        }

        Ok(buf.freeze())
    }

    /// Streams the rest of the body into `output` and returns the number of
    /// bytes written.
    pub fn copy_to<W: Write + ?Sized>(&mut self, output: &mut W) -> crate::Result<u64> {
        self.reader.write_to(output)
    }

    /// Reads the body as JSON.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    pub fn json<T: DeserializeOwned>(self) -> crate::Result<T> {
        let bytes = self.bytes()?;
        serde_json::from_slice(&bytes).map_err(crate::Error::DecodeJson)
    }

    /// Reads the body as text, decoded with the `charset` of its
    /// `Content-Type`, or UTF-8.
    pub fn text(self) -> crate::Result<String> {
        self.text_with_charset("utf-8")
    }

    /// Reads the body as text, decoded with the `charset` of its
    /// `Content-Type`, or `default_encoding` if it has none.
    pub fn text_with_charset(self, default_encoding: &str) -> crate::Result<String> {
        let encoding_name = self
            .content_type()
            .and_then(|mime| mime.get_param(mime::CHARSET))
            .map(|charset| charset.as_str().to_owned())
            .unwrap_or_else(|| default_encoding.to_owned());

        let encoding = Encoding::for_label(encoding_name.as_bytes()).unwrap_or(UTF_8);

        let bytes = self.bytes()?;

        let (text, _, _) = encoding.decode(&bytes);

        match text {
            Cow::Owned(s) => Ok(s),
            Cow::Borrowed(s) => Ok(String::from(s)),
        }
    }

    /// Abandons the whole request: the part and the underlying source are
    /// closed, buffered bytes are dropped and every later read fails.
    pub fn abort(mut self) {
        self.reader.abort();
    }

    /// Converts the part into its body reader.
    pub fn into_reader(self) -> PartReader<'a, R> {
        self.reader
    }
}

impl<'a, R: Read> Read for Part<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<'a, R: Read> BufRead for Part<'a, R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.reader.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.reader.consume(amt)
    }
}
