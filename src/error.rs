use std::fmt::{self, Debug, Display, Formatter};
use std::io;

use derive_more::Display;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A set of errors that can occur while decoding a multipart stream and in
/// other operations.
#[derive(Display)]
#[non_exhaustive]
pub enum Error {
    /// Reading from the underlying byte source failed.
    #[display(fmt = "stream read failed: {}", _0)]
    StreamReadFailed(io::Error),

    /// Writing part data to an output failed.
    #[display(fmt = "failed to write part data: {}", _0)]
    StreamWriteFailed(io::Error),

    /// The stream violates the multipart format: it ended before a boundary
    /// was found, a boundary is followed by unexpected bytes, or a header
    /// block is not terminated within
    /// [`HEADER_PART_SIZE_MAX`](crate::HEADER_PART_SIZE_MAX) bytes.
    #[display(fmt = "malformed multipart stream: {}", reason)]
    MalformedStream { reason: String, cause: Option<BoxError> },

    /// A replacement boundary token does not have the length of the current
    /// one.
    #[display(
        fmt = "the length of a boundary token can not be changed: expected {} bytes, got {}",
        expected,
        actual
    )]
    IllegalBoundary { expected: usize, actual: usize },

    /// A read or skip was attempted on a part reader that is already closed.
    #[display(fmt = "part has already been consumed")]
    PartAlreadyConsumed,

    /// The configured working buffer can't hold a full delimiter.
    #[display(fmt = "buffer size {} is too small, at least {} bytes are required", size, min)]
    BufferTooSmall { size: usize, min: usize },

    /// Failed to read the part headers.
    #[display(fmt = "failed to read headers: {}", _0)]
    ReadHeaderFailed(httparse::Error),

    /// Failed to decode the part's raw header name to
    /// [`HeaderName`](http::header::HeaderName) type.
    #[display(fmt = "failed to decode part's raw header name: {:?} {}", name, cause)]
    DecodeHeaderName { name: String, cause: BoxError },

    /// Failed to decode the part's raw header value to
    /// [`HeaderValue`](http::header::HeaderValue) type.
    #[display(fmt = "failed to decode part's raw header value: {}", cause)]
    DecodeHeaderValue { value: Vec<u8>, cause: BoxError },

    /// The `Content-Type` header is not `multipart/form-data`.
    #[display(fmt = "Content-Type is not multipart/form-data")]
    NoMultipart,

    /// Failed to convert the `Content-Type` to [`mime::Mime`] type.
    #[display(fmt = "Failed to convert Content-Type to `mime::Mime` type: {}", _0)]
    DecodeContentType(mime::FromStrError),

    /// No boundary found in `Content-Type` header.
    #[display(fmt = "multipart boundary not found in Content-Type")]
    NoBoundary,

    /// Failed to decode the part data as `JSON` in
    /// [`part.json()`](crate::Part::json) method.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    #[display(fmt = "failed to decode part data as JSON: {}", _0)]
    DecodeJson(serde_json::Error),
}

impl Error {
    pub(crate) fn malformed<T: Into<String>>(reason: T) -> Error {
        Error::MalformedStream {
            reason: reason.into(),
            cause: None,
        }
    }

    pub(crate) fn malformed_with<T, E>(reason: T, cause: E) -> Error
    where
        T: Into<String>,
        E: Into<BoxError>,
    {
        Error::MalformedStream {
            reason: reason.into(),
            cause: Some(cause.into()),
        }
    }

    /// Returns `true` for protocol violations of the multipart format.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::MalformedStream { .. })
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::StreamReadFailed(err) | Error::StreamWriteFailed(err) => Some(err),
            Error::MalformedStream { cause: Some(cause), .. } => Some(cause.as_ref()),
            Error::ReadHeaderFailed(err) => Some(err),
            Error::DecodeHeaderName { cause, .. } | Error::DecodeHeaderValue { cause, .. } => Some(cause.as_ref()),
            Error::DecodeContentType(err) => Some(err),
            #[cfg(feature = "json")]
            Error::DecodeJson(err) => Some(err),
            _ => None,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::StreamReadFailed(err) | Error::StreamWriteFailed(err) => err,
            Error::MalformedStream { .. } => io::Error::new(io::ErrorKind::InvalidData, err),
            err => io::Error::new(io::ErrorKind::Other, err),
        }
    }
}
