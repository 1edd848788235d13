pub(crate) const CR: u8 = b'\r';
pub(crate) const LF: u8 = b'\n';
pub(crate) const DASH: u8 = b'-';

/// The maximum length of a part's header block, terminator included.
pub const HEADER_PART_SIZE_MAX: usize = 10240;

pub(crate) const DEFAULT_BUF_SIZE: usize = 4096;
pub(crate) const MAX_HEADERS: usize = 32;

pub(crate) const HEADER_SEPARATOR: [u8; 4] = [CR, LF, CR, LF];
pub(crate) const FIELD_SEPARATOR: [u8; 2] = [CR, LF];
pub(crate) const STREAM_TERMINATOR: [u8; 2] = [DASH, DASH];
pub(crate) const BOUNDARY_PREFIX: [u8; 4] = [CR, LF, DASH, DASH];

/// Extra room the working buffer needs beyond the delimiter itself.
pub(crate) const BUF_SIZE_SLACK: usize = 4;

pub(crate) fn min_buffer_size(token_len: usize) -> usize {
    BOUNDARY_PREFIX.len() + token_len + BUF_SIZE_SLACK
}
