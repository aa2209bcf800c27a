//! Framing for one compressed block: lengths, optional per-block checksums, and the
//! store-vs-compress decision, delegating the actual codec work to [`crate::lzo`].

use std::io::{Read, Write};

use fehler::{throw, throws};
use log::{debug, warn};

use crate::adler32::checksum;
use crate::error::{truncated, LzopError};
use crate::header::Flags;
use crate::lzo;
use crate::primitive::{read_u32, write_u32};

pub const BLOCK_SIZE: usize = 131_072;
pub const MAX_BLOCK_SIZE: u32 = 67_108_864;

/// Reads one block. `Ok(None)` means the terminator (a zero-length block) was read.
#[throws(LzopError)]
pub fn read_block<R: Read>(r: &mut R, flags: Flags, verify: bool) -> Option<Vec<u8>> {
    let uncompressed_len = read_u32(r).map_err(truncated("block uncompressed length"))?;
    if uncompressed_len == 0 {
        return None;
    }
    if uncompressed_len > MAX_BLOCK_SIZE {
        throw!(LzopError::BlockTooLarge { found: uncompressed_len, max: MAX_BLOCK_SIZE });
    }

    let compressed_len = read_u32(r).map_err(truncated("block compressed length"))?;

    let d_adler = if flags.contains(Flags::ADLER32_D) {
        Some(read_u32(r).map_err(truncated("block uncompressed checksum"))?)
    } else {
        None
    };
    if flags.contains(Flags::CRC32_D) {
        read_u32(r).map_err(truncated("block uncompressed crc"))?;
    }

    let c_adler = if flags.contains(Flags::ADLER32_C) {
        if compressed_len < uncompressed_len {
            Some(read_u32(r).map_err(truncated("block compressed checksum"))?)
        } else {
            d_adler
        }
    } else {
        None
    };
    if flags.contains(Flags::CRC32_C) && compressed_len < uncompressed_len {
        read_u32(r).map_err(truncated("block compressed crc"))?;
    }

    let mut payload = vec![0u8; compressed_len as usize];
    r.read_exact(&mut payload).map_err(truncated("block payload"))?;

    let plaintext = if compressed_len < uncompressed_len {
        if verify {
            if let Some(expected) = c_adler {
                let found = checksum(&payload);
                if found != expected {
                    warn!(
                        "lzop block compressed checksum mismatch: expected {:08x}, found {:08x}",
                        expected,
                        found
                    );
                    throw!(LzopError::ChecksumMismatch("block compressed data"));
                }
            }
        }
        lzo::decompress_block(&payload, uncompressed_len as usize)?
    } else {
        payload
    };

    if verify {
        if let Some(expected) = d_adler {
            let found = checksum(&plaintext);
            if found != expected {
                warn!(
                    "lzop block uncompressed checksum mismatch: expected {:08x}, found {:08x}",
                    expected,
                    found
                );
                throw!(LzopError::ChecksumMismatch("block uncompressed data"));
            }
        }
    }

    Some(plaintext)
}

/// Writes one block of plaintext (non-empty, at most `BLOCK_SIZE` bytes).
#[throws(LzopError)]
pub fn write_block<W: Write>(w: &mut W, plaintext: &[u8]) {
    debug_assert!(!plaintext.is_empty());
    debug_assert!(plaintext.len() <= BLOCK_SIZE);

    let uncompressed_len = plaintext.len() as u32;
    write_u32(w, uncompressed_len).map_err(LzopError::Io)?;

    let d_adler = checksum(plaintext);
    let candidate = lzo::compress_block(plaintext)?;

    if candidate.len() < plaintext.len() {
        let c_adler = checksum(&candidate);
        write_u32(w, candidate.len() as u32).map_err(LzopError::Io)?;
        write_u32(w, d_adler).map_err(LzopError::Io)?;
        write_u32(w, c_adler).map_err(LzopError::Io)?;
        w.write_all(&candidate).map_err(LzopError::Io)?;
    } else {
        debug!("storing {} byte block raw (no compression gain)", plaintext.len());
        write_u32(w, uncompressed_len).map_err(LzopError::Io)?;
        write_u32(w, d_adler).map_err(LzopError::Io)?;
        w.write_all(plaintext).map_err(LzopError::Io)?;
    }
}

#[throws(LzopError)]
pub fn write_terminator<W: Write>(w: &mut W) {
    write_u32(w, 0).map_err(LzopError::Io)?;
}
