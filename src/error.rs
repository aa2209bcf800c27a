use std::io;

use thiserror::Error;

/// Everything that can go wrong while framing or unframing an `lzop` container.
#[derive(Error, Debug)]
pub enum LzopError {
    #[error("input does not start with the lzop magic signature")]
    BadMagic,

    #[error("extract-version 0x{found:04x} is not supported (need 0x0900..=0x{max:04x})")]
    UnsupportedVersion { found: u16, max: u16 },

    #[error("header declares an unsupported feature: {0}")]
    UnsupportedFeature(&'static str),

    #[error("header declares compression method {0}, expected 1, 2 or 3")]
    BadMethod(u8),

    #[error("{0} checksum did not match the recomputed value")]
    ChecksumMismatch(&'static str),

    #[error("block declares an uncompressed length of {found} bytes, exceeding the {max} byte limit")]
    BlockTooLarge { found: u32, max: u32 },

    #[error("the LZO codec failed or returned an unexpected length")]
    DecompressFailure,

    #[error("operation attempted on a closed stream")]
    ClosedStream,

    #[error("illegal seek: {0}")]
    IllegalSeek(&'static str),

    #[error("illegal operation for this stream: {0}")]
    IllegalMode(&'static str),

    #[error("unexpected end of input while reading {0}")]
    Truncated(&'static str),

    #[error("name is {0} bytes long, but lzop headers only allow names shorter than 255 bytes")]
    NameTooLong(usize),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<LzopError> for io::Error {
    fn from(e: LzopError) -> io::Error {
        match e {
            LzopError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}

/// Reclassifies a short read against a required field as `Truncated` rather than the
/// generic `Io` wrapper, since that's the more precise diagnosis for this crate's wire format.
pub fn truncated(field: &'static str) -> impl FnOnce(io::Error) -> LzopError {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            LzopError::Truncated(field)
        } else {
            LzopError::Io(e)
        }
    }
}
