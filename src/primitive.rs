//! Big-endian integer primitives, in tracked (checksum-accumulating) and raw flavors.
//!
//! The tracked family is used while a header is being parsed/emitted, since the header
//! checksum covers the exact bytes on the wire; the raw family (a thin `byteorder` shim)
//! is used everywhere else, past the point where the header checksum has already closed.

use std::io::{self, Read, Write};

use byteorder::{BigEndian as BE, ReadBytesExt, WriteBytesExt};

use crate::adler32::ChecksumEngine;

pub fn read_u8_c<R: Read>(r: &mut R, cksum: &mut ChecksumEngine) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    cksum.update(&buf);
    Ok(buf[0])
}

pub fn read_u16_c<R: Read>(r: &mut R, cksum: &mut ChecksumEngine) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    cksum.update(&buf);
    Ok(u16::from_be_bytes(buf))
}

pub fn read_u32_c<R: Read>(r: &mut R, cksum: &mut ChecksumEngine) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    cksum.update(&buf);
    Ok(u32::from_be_bytes(buf))
}

pub fn read_bytes_c<R: Read>(r: &mut R, n: usize, cksum: &mut ChecksumEngine) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; n];
    r.read_exact(&mut buf)?;
    cksum.update(&buf);
    Ok(buf)
}

pub fn write_u8_c<W: Write>(w: &mut W, v: u8, cksum: &mut ChecksumEngine) -> io::Result<()> {
    let buf = [v];
    w.write_all(&buf)?;
    cksum.update(&buf);
    Ok(())
}

pub fn write_u16_c<W: Write>(w: &mut W, v: u16, cksum: &mut ChecksumEngine) -> io::Result<()> {
    let buf = v.to_be_bytes();
    w.write_all(&buf)?;
    cksum.update(&buf);
    Ok(())
}

pub fn write_u32_c<W: Write>(w: &mut W, v: u32, cksum: &mut ChecksumEngine) -> io::Result<()> {
    let buf = v.to_be_bytes();
    w.write_all(&buf)?;
    cksum.update(&buf);
    Ok(())
}

pub fn write_bytes_c<W: Write>(w: &mut W, bytes: &[u8], cksum: &mut ChecksumEngine) -> io::Result<()> {
    w.write_all(bytes)?;
    cksum.update(bytes);
    Ok(())
}

pub fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    r.read_u32::<BE>()
}

pub fn write_u32<W: Write>(w: &mut W, v: u32) -> io::Result<()> {
    w.write_u32::<BE>(v)
}
