//! `LzopReader`/`LzopWriter`: the `std::io::{Read, Write, Seek}` facade over the header
//! and block codecs.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::trace;

use crate::block::{read_block, write_block, write_terminator, BLOCK_SIZE};
use crate::error::LzopError;
use crate::header::{read_header, read_magic, write_header, write_magic, Header};

/// Reads an `lzop` container, presenting the decompressed contents as a byte stream.
pub struct LzopReader<R: Read + Seek> {
    inner: Option<R>,
    header: Header,
    verify: bool,
    pending: VecDeque<u8>,
    offset: u64,
    finished: bool,
    closed: bool,
}

impl<R: Read + Seek> LzopReader<R> {
    /// Parses magic and header eagerly; `verify` controls whether Adler-32 checksums
    /// (header, and per-block where present) are checked as the stream is consumed.
    pub fn new(mut inner: R, verify: bool) -> Result<Self, LzopError> {
        read_magic(&mut inner)?;
        let header = read_header(&mut inner, verify)?;
        Ok(LzopReader {
            inner: Some(inner),
            header,
            verify,
            pending: VecDeque::new(),
            offset: 0,
            finished: false,
            closed: false,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    fn check_open(&self) -> Result<(), LzopError> {
        if self.closed {
            return Err(LzopError::ClosedStream);
        }
        Ok(())
    }

    fn source(&mut self) -> &mut R {
        self.inner.as_mut().expect("source only taken by close()")
    }

    fn fill_at_least(&mut self, want: usize) -> Result<(), LzopError> {
        while self.pending.len() < want && !self.finished {
            match read_block(self.source(), self.header.flags, self.verify)? {
                Some(block) => self.pending.extend(block),
                None => self.finished = true,
            }
        }
        Ok(())
    }

    fn rewind(&mut self) -> Result<(), LzopError> {
        trace!("rewinding lzop reader to re-derive a backward seek");
        self.source().seek(SeekFrom::Start(0)).map_err(LzopError::Io)?;
        read_magic(self.source())?;
        self.header = read_header(self.source(), self.verify)?;
        self.pending.clear();
        self.offset = 0;
        self.finished = false;
        Ok(())
    }

    /// Releases the underlying source, if owned by value, and marks the reader closed.
    /// Idempotent: a second call is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.inner.take();
    }
}

impl<R: Read + Seek> Read for LzopReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check_open()?;
        self.fill_at_least(buf.len())?;

        let n = buf.len().min(self.pending.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.pending.pop_front().expect("checked length above");
        }
        self.offset += n as u64;
        Ok(n)
    }
}

impl<R: Read + Seek> Seek for LzopReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.check_open()?;
        let target = match pos {
            SeekFrom::Start(n) => n,
            SeekFrom::Current(delta) => {
                let base = self.offset as i64;
                (base + delta).max(0) as u64
            }
            SeekFrom::End(_) => return Err(LzopError::IllegalSeek("SeekFrom::End is not supported").into()),
        };

        if target < self.offset {
            trace!("seek target {} precedes current offset {}, rewinding", target, self.offset);
            self.rewind().map_err(io::Error::from)?;
        }

        let mut scratch = [0u8; 4096];
        while self.offset < target {
            let want = ((target - self.offset) as usize).min(scratch.len());
            let n = self.read(&mut scratch[..want])?;
            if n == 0 {
                break;
            }
        }
        Ok(self.offset)
    }
}

impl LzopReader<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LzopError> {
        let file = File::open(path).map_err(LzopError::Io)?;
        Self::new(file, true)
    }
}

/// Writes an `lzop` container, framing whatever is written into `BLOCK_SIZE` blocks.
pub struct LzopWriter<W: Write> {
    inner: Option<W>,
    pending: Vec<u8>,
    offset: u64,
    finished: bool,
    closed: bool,
}

impl<W: Write> LzopWriter<W> {
    /// Emits magic and header eagerly, naming the entry `name` (must be under 255 bytes).
    pub fn new(mut inner: W, name: &[u8]) -> Result<Self, LzopError> {
        write_magic(&mut inner)?;
        write_header(&mut inner, name)?;
        Ok(LzopWriter { inner: Some(inner), pending: Vec::new(), offset: 0, finished: false, closed: false })
    }

    fn check_open(&self) -> Result<(), LzopError> {
        if self.closed {
            return Err(LzopError::ClosedStream);
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), LzopError> {
        self.check_open()?;
        if self.finished {
            return Err(LzopError::IllegalMode("cannot write after finish() has emitted the terminator"));
        }
        Ok(())
    }

    fn sink(&mut self) -> &mut W {
        self.inner.as_mut().expect("sink only taken by close()")
    }

    fn flush_full_blocks(&mut self) -> Result<(), LzopError> {
        while self.pending.len() >= BLOCK_SIZE {
            let block: Vec<u8> = self.pending.drain(..BLOCK_SIZE).collect();
            write_block(self.sink(), &block)?;
        }
        Ok(())
    }

    /// Flushes any partial pending block and writes the terminator. Idempotent.
    pub fn finish(&mut self) -> Result<(), LzopError> {
        if self.finished {
            return Ok(());
        }
        if !self.pending.is_empty() {
            let block = std::mem::take(&mut self.pending);
            write_block(self.sink(), &block)?;
        }
        write_terminator(self.sink())?;
        self.finished = true;
        Ok(())
    }

    /// Finishes and releases the underlying sink; further operations fail with `ClosedStream`.
    pub fn close(&mut self) -> Result<(), LzopError> {
        if self.closed {
            return Ok(());
        }
        self.finish()?;
        self.closed = true;
        self.inner.take();
        Ok(())
    }
}

impl<W: Write> Write for LzopWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_writable()?;
        self.pending.extend_from_slice(buf);
        self.flush_full_blocks().map_err(io::Error::from)?;
        self.offset += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check_open()?;
        if let Some(sink) = self.inner.as_mut() {
            sink.flush()?;
        }
        Ok(())
    }
}

impl<W: Write> Seek for LzopWriter<W> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.check_open()?;
        let target = match pos {
            SeekFrom::Start(n) => n,
            SeekFrom::Current(delta) => {
                let base = self.offset as i64;
                (base + delta).max(0) as u64
            }
            SeekFrom::End(_) => return Err(LzopError::IllegalSeek("SeekFrom::End is not supported").into()),
        };

        if target < self.offset {
            return Err(LzopError::IllegalSeek("cannot seek backward on a writer").into());
        }

        let pad = (target - self.offset) as usize;
        let zeroes = vec![0u8; pad];
        let mut written = 0;
        while written < zeroes.len() {
            let chunk = &zeroes[written..];
            written += self.write(chunk)?;
        }
        Ok(self.offset)
    }
}

impl LzopWriter<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, LzopError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = File::create(path).map_err(LzopError::Io)?;
        Self::new(file, name.as_bytes())
    }
}

impl<W: Write> Drop for LzopWriter<W> {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.finish();
        }
    }
}
