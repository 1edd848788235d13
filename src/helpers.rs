use std::convert::TryFrom;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use httparse::Header;

use crate::constants;

pub(crate) fn convert_raw_headers_to_header_map(raw_headers: &[Header]) -> crate::Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(raw_headers.len());

    for raw_header in raw_headers {
        let name = HeaderName::try_from(raw_header.name).map_err(|err| crate::Error::DecodeHeaderName {
            name: raw_header.name.to_owned(),
            cause: err.into(),
        })?;

        let value = HeaderValue::try_from(raw_header.value).map_err(|err| crate::Error::DecodeHeaderValue {
            value: raw_header.value.to_owned(),
            cause: err.into(),
        })?;

        headers.append(name, value);
    }

    Ok(headers)
}

/// Parses a raw header block, terminator included, into a [`HeaderMap`].
pub(crate) fn parse_header_block(block: &[u8]) -> crate::Result<HeaderMap> {
    let mut headers = [httparse::EMPTY_HEADER; constants::MAX_HEADERS];

    match httparse::parse_headers(block, &mut headers) {
        Ok(httparse::Status::Complete((_, raw_headers))) => convert_raw_headers_to_header_map(raw_headers),
        Ok(httparse::Status::Partial) => Err(crate::Error::malformed("incomplete part headers")),
        Err(err) => Err(crate::Error::ReadHeaderFailed(err)),
    }
}
