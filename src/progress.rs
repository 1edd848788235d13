use std::fmt::{self, Debug, Formatter};

/// Receives progress updates while a multipart stream is decoded.
///
/// `update` is invoked synchronously on the decoding thread, once per buffer
/// refill and once per detected part.
pub trait ProgressListener {
    /// Reports the bytes read from the source so far, the expected content
    /// length if known, and the number of parts seen so far.
    fn update(&mut self, bytes_read: u64, content_length: Option<u64>, items: u32);
}

impl<F> ProgressListener for F
where
    F: FnMut(u64, Option<u64>, u32),
{
    fn update(&mut self, bytes_read: u64, content_length: Option<u64>, items: u32) {
        self(bytes_read, content_length, items)
    }
}

/// Accumulates the byte and part counters of a stream and forwards them to an
/// optional [`ProgressListener`].
pub struct ProgressNotifier {
    listener: Option<Box<dyn ProgressListener + Send>>,
    content_length: Option<u64>,
    bytes_read: u64,
    items: u32,
}

impl ProgressNotifier {
    pub(crate) fn new(listener: Option<Box<dyn ProgressListener + Send>>, content_length: Option<u64>) -> Self {
        if listener.is_some() {
            debug!("installing progress listener, content length: {:?}", content_length);
        }

        ProgressNotifier {
            listener,
            content_length,
            bytes_read: 0,
            items: 0,
        }
    }

    pub(crate) fn note_bytes_read(&mut self, bytes: usize) {
        self.bytes_read += bytes as u64;
        self.notify();
    }

    pub(crate) fn note_item(&mut self) {
        self.items += 1;
        self.notify();
    }

    fn notify(&mut self) {
        if let Some(listener) = self.listener.as_mut() {
            listener.update(self.bytes_read, self.content_length, self.items);
        }
    }

    /// Total number of bytes read from the underlying source.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Number of parts detected so far.
    pub fn items(&self) -> u32 {
        self.items
    }

    /// The expected length of the whole request body, if it was provided.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }
}

impl Default for ProgressNotifier {
    fn default() -> Self {
        ProgressNotifier::new(None, None)
    }
}

impl Debug for ProgressNotifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressNotifier")
            .field("has_listener", &self.listener.is_some())
            .field("content_length", &self.content_length)
            .field("bytes_read", &self.bytes_read)
            .field("items", &self.items)
            .finish()
    }
}
