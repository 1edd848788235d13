use encoding_rs::Encoding;

use crate::constants;
use crate::progress::{ProgressListener, ProgressNotifier};

/// Settings of a [`MultipartStream`](crate::MultipartStream).
///
/// # Examples
///
/// ```
/// use formpart::{Config, MultipartStream};
///
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
///
/// let config = Config::new()
///     .buffer_size(64)
///     .header_charset("iso-8859-1")
///     .progress_listener(|read: u64, total: Option<u64>, items: u32| println!("{} / {:?} ({})", read, total, items), Some(data.len() as u64));
///
/// let stream = MultipartStream::with_config(data.as_bytes(), "X-BOUNDARY", config).unwrap();
/// assert_eq!(stream.buffer_size(), 64);
/// ```
pub struct Config {
    pub(crate) buffer_size: Option<usize>,
    pub(crate) header_encoding: Option<&'static Encoding>,
    pub(crate) notifier: ProgressNotifier,
}

impl Config {
    /// Creates the default configuration: a 4096 byte buffer, UTF-8 headers
    /// and no progress listener.
    pub fn new() -> Config {
        Config::default()
    }

    /// Sets the capacity of the working buffer.
    ///
    /// It must hold at least the delimiter (`CRLF--` plus the boundary token)
    /// and four more bytes, otherwise construction fails with
    /// [`Error::BufferTooSmall`](crate::Error::BufferTooSmall).
    pub fn buffer_size(mut self, size: usize) -> Config {
        self.buffer_size = Some(size);
        self
    }

    /// Sets the charset used to decode part headers by its label, e.g.
    /// `"iso-8859-1"`. Unknown labels fall back to UTF-8.
    pub fn header_charset<L: AsRef<str>>(mut self, label: L) -> Config {
        let label = label.as_ref();
        let encoding = Encoding::for_label(label.as_bytes());

        if encoding.is_none() {
            warn!("unknown header charset {:?}, falling back to UTF-8", label);
        }

        self.header_encoding = encoding;
        self
    }

    /// Sets the encoding used to decode part headers.
    pub fn header_encoding(mut self, encoding: &'static Encoding) -> Config {
        self.header_encoding = Some(encoding);
        self
    }

    /// Installs a listener that is told about every buffer refill and every
    /// detected part. `content_length` is passed through to the listener.
    pub fn progress_listener<L>(mut self, listener: L, content_length: Option<u64>) -> Config
    where
        L: ProgressListener + Send + 'static,
    {
        self.notifier = ProgressNotifier::new(Some(Box::new(listener)), content_length);
        self
    }

    pub(crate) fn resolve_buffer_size(&self, token_len: usize) -> crate::Result<usize> {
        let min = constants::min_buffer_size(token_len);

        match self.buffer_size {
            Some(size) if size < min => Err(crate::Error::BufferTooSmall { size, min }),
            Some(size) => Ok(size),
            None => Ok(constants::DEFAULT_BUF_SIZE.max(min)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            buffer_size: None,
            header_encoding: None,
            notifier: ProgressNotifier::default(),
        }
    }
}
