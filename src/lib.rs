#![forbid(unsafe_code)]

//! A streaming reader/writer for the `lzop` container format.
//!
//! `lzop` files wrap LZO1X-compressed blocks in a small framing format: a fixed magic
//! prefix, a header carrying metadata and an Adler-32 over itself, then a sequence of
//! length-prefixed blocks (each optionally checksummed) terminated by a zero-length
//! block. This crate frames and unframes that container; the LZO1X codec itself is
//! delegated to the system `liblzo2` binding via the `rust-lzo` crate.
//!
//! ```no_run
//! use std::io::{Cursor, Read, Write};
//! use lzop::{LzopReader, LzopWriter};
//!
//! let mut container = Vec::new();
//! {
//!     let mut writer = LzopWriter::new(Cursor::new(&mut container), b"greeting.txt").unwrap();
//!     writer.write_all(b"hello, lzop!").unwrap();
//!     writer.finish().unwrap();
//! }
//!
//! let mut reader = LzopReader::new(Cursor::new(container), true).unwrap();
//! let mut out = Vec::new();
//! reader.read_to_end(&mut out).unwrap();
//! assert_eq!(out, b"hello, lzop!");
//! ```

mod adler32;
mod block;
mod error;
mod header;
mod lzo;
mod primitive;
mod stream;

pub use block::{BLOCK_SIZE, MAX_BLOCK_SIZE};
pub use error::LzopError;
pub use header::{Flags, Header, LZOP_VERSION, LZO_LIB_VERSION, MAGIC};
pub use stream::{LzopReader, LzopWriter};
