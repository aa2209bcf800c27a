//! The Adler-32 checksum engine (RFC 1950).
//!
//! Two independent accumulators are used by the rest of the crate: one scoped to a single
//! header parse/emit (folding many small tracked reads/writes), and one-shot ones created
//! fresh for each block's checksum, which never share state with the header's.

use std::hash::Hasher;

use adler32::Adler32;

/// A resettable Adler-32 accumulator, seeded at 1 per RFC 1950.
pub struct ChecksumEngine(Adler32);

impl ChecksumEngine {
    pub fn new() -> Self {
        ChecksumEngine(Adler32::new())
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.0.write(bytes);
    }

    pub fn state(&self) -> u32 {
        self.0.finish() as u32
    }

    pub fn reset(&mut self) {
        self.0 = Adler32::new();
    }
}

impl Default for ChecksumEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot Adler-32 of a full buffer, starting from the initial state.
pub fn checksum(bytes: &[u8]) -> u32 {
    let mut engine = ChecksumEngine::new();
    engine.update(bytes);
    engine.state()
}
