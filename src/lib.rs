//! A streaming parser for `multipart/form-data` request bodies.
//!
//! The body is read from any [`std::io::Read`] source through a fixed-size
//! working buffer, so memory use does not grow with the size of the request.
//! Parts are handed out one at a time and their bodies are read lazily.
//!
//! Two layers are provided:
//!
//! * [`Multipart`] yields [`Part`]s with their parsed headers, field name,
//!   file name and content type.
//! * [`MultipartStream`] is the underlying pull decoder: skip the preamble,
//!   read a header block, read or discard a body through a [`PartReader`],
//!   read the next boundary.
//!
//! # Examples
//!
//! ```
//! use formpart::Multipart;
//!
//! # fn run() -> formpart::Result<()> {
//! let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_file_field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\r\n--X-BOUNDARY--\r\n";
//!
//! let mut multipart = Multipart::new(data.as_bytes(), "X-BOUNDARY");
//!
//! while let Some(part) = multipart.next_part()? {
//!     let name = part.name().map(|name| name.to_owned());
//!     let file_name = part.file_name().map(|file_name| file_name.to_owned());
//!
//!     println!("Name: {:?}, File Name: {:?}", name, file_name);
//!     println!("Content: {:?}", part.text()?);
//! }
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
//!
//! # Optional features
//!
//! * `log` (default): trace the decoding through the [`log`](https://docs.rs/log) crate.
//! * `json`: adds [`Part::json`].

#![cfg_attr(nightly, feature(doc_cfg))]

#[cfg(feature = "log")]
macro_rules! trace {
    ($($t:tt)*) => (::log::trace!($($t)*));
}

#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($t:tt)*) => {{
        let _ = format_args!($($t)*);
    }};
}

#[cfg(feature = "log")]
macro_rules! debug {
    ($($t:tt)*) => (::log::debug!($($t)*));
}

#[cfg(not(feature = "log"))]
macro_rules! debug {
    ($($t:tt)*) => {{
        let _ = format_args!($($t)*);
    }};
}

#[cfg(feature = "log")]
macro_rules! warn {
    ($($t:tt)*) => (::log::warn!($($t)*));
}

#[cfg(not(feature = "log"))]
macro_rules! warn {
    ($($t:tt)*) => {{
        let _ = format_args!($($t)*);
    }};
}

pub use bytes;
pub use config::Config;
pub use constants::HEADER_PART_SIZE_MAX;
pub use error::Error;
pub use multipart::Multipart;
pub use multipart_stream::MultipartStream;
pub use params::parse_params;
pub use part::Part;
pub use part_reader::PartReader;
pub use progress::{ProgressListener, ProgressNotifier};

mod boundary;
mod buffer;
mod config;
mod constants;
mod content_disposition;
mod error;
mod helpers;
mod multipart;
mod multipart_stream;
mod params;
mod part;
mod part_reader;
mod progress;
mod state;

/// A Result type often returned from methods that can have `formpart` errors.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Parses the `Content-Type` header to extract the boundary value.
///
/// # Examples
///
/// ```
/// # fn run() {
/// let content_type = "multipart/form-data; boundary=ABCDEFG";
///
/// assert_eq!(formpart::parse_boundary(content_type), Ok("ABCDEFG".to_owned()));
/// # }
/// # run();
/// ```
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> Result<String> {
    let m = content_type
        .as_ref()
        .parse::<mime::Mime>()
        .map_err(Error::DecodeContentType)?;

    if !(m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA) {
        return Err(Error::NoMultipart);
    }

    m.get_param(mime::BOUNDARY)
        .map(|name| name.as_str().to_owned())
        .ok_or(Error::NoBoundary)
}
