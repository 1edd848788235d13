use std::io::Read;

use encoding_rs::UTF_8;
use http::header::HeaderMap;

use crate::config::Config;
use crate::content_disposition::ContentDisposition;
use crate::helpers;
use crate::multipart_stream::MultipartStream;
use crate::state::StreamingStage;
use crate::Part;

/// Represents the implementation of `multipart/form-data` formatted data.
///
/// This will parse the source reader into [`Part`] instances, one at a time:
/// a part borrows the `Multipart`, so the next one can only be requested once
/// the previous one is gone. Whatever a part left unread is skipped then.
///
/// Any error is fatal, no further parts are yielded after it.
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
///     println!("Part: {:?}", part.text());
/// }
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
pub struct Multipart<R> {
    stream: MultipartStream<R>,
    stage: StreamingStage,
    next_part_idx: usize,
}

impl<R: Read> Multipart<R> {
    /// Construct a new `Multipart` instance with the given reader and the
    /// boundary.
    pub fn new<B: AsRef<[u8]>>(reader: R, boundary: B) -> Multipart<R> {
        Multipart::from_stream(MultipartStream::new(reader, boundary))
    }

    /// Construct a new `Multipart` instance with the given reader, boundary
    /// and [`Config`].
    pub fn with_config<B: AsRef<[u8]>>(reader: R, boundary: B, config: Config) -> crate::Result<Multipart<R>> {
        MultipartStream::with_config(reader, boundary, config).map(Multipart::from_stream)
    }

    /// Construct a new `Multipart` instance with the given reader, taking the
    /// boundary from a `Content-Type` header value.
    ///
    /// # Examples
    ///
    /// ```
    /// use formpart::Multipart;
    ///
    /// let data = "--X-BOUNDARY--\r\n";
    /// let mut multipart = Multipart::from_content_type(data.as_bytes(), "multipart/form-data; boundary=X-BOUNDARY").unwrap();
    ///
    /// assert!(multipart.next_part().unwrap().is_none());
    /// ```
    pub fn from_content_type<T: AsRef<str>>(reader: R, content_type: T) -> crate::Result<Multipart<R>> {
        let boundary = crate::parse_boundary(content_type)?;
        Ok(Multipart::new(reader, boundary))
    }

    /// Wraps a [`MultipartStream`] that hasn't been read from yet.
    pub fn from_stream(stream: MultipartStream<R>) -> Multipart<R> {
        Multipart {
            stream,
            stage: StreamingStage::FindingFirstBoundary,
            next_part_idx: 0,
        }
    }

    /// Yields the next [`Part`] if available.
    pub fn next_part(&mut self) -> crate::Result<Option<Part<'_, R>>> {
        let headers = match self.find_next_part() {
            Ok(Some(headers)) => headers,
            Ok(None) => return Ok(None),
            Err(err) => {
                debug!("multipart stream failed at part {}: {}", self.next_part_idx, err);
                self.stage = StreamingStage::Eof;
                return Err(err);
            }
        };

        let idx = self.next_part_idx;
        self.next_part_idx += 1;

        let encoding = self.stream.header_encoding().unwrap_or(UTF_8);
        let content_disposition = ContentDisposition::parse(&headers, encoding);
        trace!("part {} found, name: {:?}", idx, content_disposition.field_name);

        Ok(Some(Part::new(
            self.stream.part_reader(),
            headers,
            idx,
            content_disposition,
        )))
    }

    /// Yields the next [`Part`] with its positioning index as a tuple
    /// `(usize, Part)`.
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
    /// while let Some((idx, part)) = multipart.next_part_with_idx()? {
    ///     println!("Index: {:?}, Content: {:?}", idx, part.text()?)
    /// }
    /// # Ok(())
    /// # }
    /// # run().unwrap();
    /// ```
    pub fn next_part_with_idx(&mut self) -> crate::Result<Option<(usize, Part<'_, R>)>> {
        self.next_part().map(|part| part.map(|part| (part.index(), part)))
    }

    fn find_next_part(&mut self) -> crate::Result<Option<HeaderMap>> {
        let found = match self.stage {
            StreamingStage::Eof => return Ok(None),
            StreamingStage::FindingFirstBoundary => self.stream.skip_preamble()?,
            StreamingStage::ReadingFieldData => {
                let skipped = self.stream.discard_body_data()?;
                if skipped > 0 {
                    trace!("skipped {} unread bytes of the previous part", skipped);
                }
                self.stream.read_boundary()?
            }
        };

        if !found {
            self.stage = StreamingStage::Eof;
            return Ok(None);
        }

        let raw = self.stream.read_header_bytes()?;
        let headers = helpers::parse_header_block(&raw)?;

        self.stage = StreamingStage::ReadingFieldData;
        Ok(Some(headers))
    }

    /// The underlying decoder, e.g. for its progress counters.
    pub fn stream(&self) -> &MultipartStream<R> {
        &self.stream
    }

    /// Consumes the `Multipart` and returns the underlying decoder.
    pub fn into_stream(self) -> MultipartStream<R> {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const DATA: &str = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"My Field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"File Field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\nHello\r\nWorld\rAgain\r\n--X-BOUNDARY--\r\n";

    #[test]
    fn test_stage_transitions() {
        let mut m = Multipart::new(Cursor::new(DATA), "X-BOUNDARY");
        assert_eq!(m.stage, StreamingStage::FindingFirstBoundary);

        assert!(m.next_part().unwrap().is_some());
        assert_eq!(m.stage, StreamingStage::ReadingFieldData);

        assert!(m.next_part().unwrap().is_some());
        assert!(m.next_part().unwrap().is_none());
        assert_eq!(m.stage, StreamingStage::Eof);
        assert_eq!(m.stream().progress().items(), 2);
    }

    #[test]
    fn test_error_is_fatal() {
        let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nabcd\r\n--X-BOUNDARYxx";
        let mut m = Multipart::new(Cursor::new(data), "X-BOUNDARY");

        assert!(m.next_part().unwrap().is_some());
        assert!(m.next_part().unwrap_err().is_malformed());
        assert_eq!(m.stage, StreamingStage::Eof);
        assert!(m.next_part().unwrap().is_none());
    }

    #[test]
    fn test_from_content_type() {
        assert!(Multipart::from_content_type(Cursor::new(DATA), "multipart/form-data; boundary=X-BOUNDARY").is_ok());
        assert_eq!(
            Multipart::from_content_type(Cursor::new(DATA), "text/plain").err(),
            Some(crate::Error::NoMultipart)
        );
    }
}
