//! Thin wrapper around the system LZO1X codec (`rust-lzo`, a binding to liblzo2).
//!
//! This crate treats LZO1X compression as an external collaborator, per its scope: it
//! frames and unframes the container format around whatever this function pair produces.

use crate::error::LzopError;

pub fn compress_block(plaintext: &[u8]) -> Result<Vec<u8>, LzopError> {
    let mut ctx = rust_lzo::LZOContext::new();
    let mut buf = vec![0u8; rust_lzo::worst_compress(plaintext.len())];
    let error = ctx.compress(plaintext, &mut buf);
    if error != rust_lzo::LZOError::OK {
        return Err(LzopError::DecompressFailure);
    }
    Ok(buf)
}

pub fn decompress_block(compressed: &[u8], expected_len: usize) -> Result<Vec<u8>, LzopError> {
    let mut out = vec![0u8; expected_len];
    let (decompressed, error) = rust_lzo::LZOContext::decompress_to_slice(compressed, &mut out);
    let n = decompressed.len();
    if error != rust_lzo::LZOError::OK || n != expected_len {
        return Err(LzopError::DecompressFailure);
    }
    out.truncate(n);
    Ok(out)
}
