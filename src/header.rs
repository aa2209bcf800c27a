//! The `lzop` header: fixed fields, flag-gated optional fields, and the Adler-32 that
//! covers all of it.

use std::io::{Read, Write};

use bitflags::bitflags;
use fehler::{throw, throws};
use log::warn;

use crate::adler32::ChecksumEngine;
use crate::error::{truncated, LzopError};
use crate::primitive::{
    read_bytes_c, read_u16_c, read_u32, read_u32_c, read_u8_c, write_bytes_c, write_u16_c, write_u32,
    write_u32_c, write_u8_c,
};

pub const MAGIC: [u8; 9] = [0x89, 0x4C, 0x5A, 0x4F, 0x00, 0x0D, 0x0A, 0x1A, 0x0A];
pub const LZOP_VERSION: u16 = 0x1030;
pub const LZO_LIB_VERSION: u16 = 0x0940;

bitflags! {
    /// The header's flag bitfield (mask 0x3FFF).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Flags: u32 {
        const ADLER32_D     = 0x0000_0001;
        const ADLER32_C     = 0x0000_0002;
        const STDIN         = 0x0000_0004;
        const STDOUT        = 0x0000_0008;
        const NAME_DEFAULT  = 0x0000_0010;
        const DOSISH        = 0x0000_0020;
        const H_EXTRA_FIELD = 0x0000_0040;
        const H_GMTDIFF     = 0x0000_0080;
        const CRC32_D       = 0x0000_0100;
        const CRC32_C       = 0x0000_0200;
        const MULTIPART     = 0x0000_0400;
        const H_FILTER      = 0x0000_0800;
        const H_CRC32       = 0x0000_1000;
        const H_PATH        = 0x0000_2000;
    }
}

pub const FLAG_MASK: u32 = 0x3FFF;

/// A fully parsed header. Fields that are absent on the wire for a given `version`
/// are represented with their natural default (0) rather than as `Option`.
#[derive(Debug, Clone)]
pub struct Header {
    pub version: u16,
    pub lib_version: u16,
    pub extract_version: u16,
    pub method: u8,
    pub level: u8,
    pub flags: Flags,
    pub filter: u32,
    pub file_mode: u32,
    pub mtime_low: u32,
    pub mtime_high: u32,
    pub name: Vec<u8>,
    pub extra: Option<Vec<u8>>,
}

#[throws(LzopError)]
pub fn read_magic<R: Read>(r: &mut R) {
    let mut buf = [0u8; 9];
    if r.read_exact(&mut buf).is_err() {
        throw!(LzopError::BadMagic);
    }
    if buf != MAGIC {
        throw!(LzopError::BadMagic);
    }
}

#[throws(LzopError)]
pub fn write_magic<W: Write>(w: &mut W) {
    w.write_all(&MAGIC).map_err(LzopError::Io)?;
}

#[throws(LzopError)]
pub fn read_header<R: Read>(r: &mut R, verify: bool) -> Header {
    let mut cksum = ChecksumEngine::new();

    let version = read_u16_c(r, &mut cksum).map_err(truncated("version"))?;
    let lib_version = read_u16_c(r, &mut cksum).map_err(truncated("lib version"))?;

    let extract_version = if version > 0x0940 {
        let v = read_u16_c(r, &mut cksum).map_err(truncated("extract version"))?;
        if v > LZOP_VERSION || v < 0x0900 {
            throw!(LzopError::UnsupportedVersion { found: v, max: LZOP_VERSION });
        }
        v
    } else {
        0
    };

    let method = read_u8_c(r, &mut cksum).map_err(truncated("method"))?;
    if !(1..=3).contains(&method) {
        throw!(LzopError::BadMethod(method));
    }

    let level = if version >= 0x0940 { read_u8_c(r, &mut cksum).map_err(truncated("level"))? } else { 0 };

    let flags_bits = read_u32_c(r, &mut cksum).map_err(truncated("flags"))? & FLAG_MASK;
    let flags = Flags::from_bits_truncate(flags_bits);
    if flags.contains(Flags::H_CRC32) {
        throw!(LzopError::UnsupportedFeature("H_CRC32 header checksum"));
    }

    let filter = if flags.contains(Flags::H_FILTER) {
        read_u32_c(r, &mut cksum).map_err(truncated("filter"))?
    } else {
        0
    };

    let file_mode = read_u32_c(r, &mut cksum).map_err(truncated("file mode"))?;
    let mtime_low = read_u32_c(r, &mut cksum).map_err(truncated("mtime low"))?;
    let mtime_high = if version >= 0x0940 {
        read_u32_c(r, &mut cksum).map_err(truncated("mtime high"))?
    } else {
        0
    };

    let name_len = read_u8_c(r, &mut cksum).map_err(truncated("name length"))? as usize;
    let name = read_bytes_c(r, name_len, &mut cksum).map_err(truncated("name"))?;

    let expected = cksum.state();
    let header_checksum = read_u32(r).map_err(truncated("header checksum"))?;
    if verify && expected != header_checksum {
        warn!(
            "lzop header checksum mismatch: expected {:08x}, found {:08x}",
            expected, header_checksum
        );
        throw!(LzopError::ChecksumMismatch("header"));
    }

    let extra = if flags.contains(Flags::H_EXTRA_FIELD) {
        let mut extra_cksum = ChecksumEngine::new();
        let extra_len = read_u32_c(r, &mut extra_cksum).map_err(truncated("extra field length"))?;
        let payload = read_bytes_c(r, extra_len as usize, &mut extra_cksum).map_err(truncated("extra field"))?;
        let expected = extra_cksum.state();
        let extra_checksum = read_u32(r).map_err(truncated("extra field checksum"))?;
        if verify && expected != extra_checksum {
            warn!(
                "lzop extra-field checksum mismatch: expected {:08x}, found {:08x}",
                expected, extra_checksum
            );
            throw!(LzopError::ChecksumMismatch("extra field"));
        }
        Some(payload)
    } else {
        None
    };

    if flags.contains(Flags::H_FILTER) {
        throw!(LzopError::UnsupportedFeature("H_FILTER"));
    }
    if flags.contains(Flags::MULTIPART) {
        throw!(LzopError::UnsupportedFeature("MULTIPART"));
    }

    Header {
        version,
        lib_version,
        extract_version,
        method,
        level,
        flags,
        filter,
        file_mode,
        mtime_low,
        mtime_high,
        name,
        extra,
    }
}

/// Writes the header this crate always emits: version 0x1030, method 1, level 1,
/// with `ADLER32_D | ADLER32_C` and no filter/extra field.
#[throws(LzopError)]
pub fn write_header<W: Write>(w: &mut W, name: &[u8]) -> Header {
    if name.len() >= 255 {
        throw!(LzopError::NameTooLong(name.len()));
    }

    let mut cksum = ChecksumEngine::new();
    let flags = Flags::ADLER32_D | Flags::ADLER32_C;

    write_u16_c(w, LZOP_VERSION, &mut cksum)?;
    write_u16_c(w, LZO_LIB_VERSION, &mut cksum)?;
    write_u16_c(w, LZO_LIB_VERSION, &mut cksum)?; // extract-version
    write_u8_c(w, 1, &mut cksum)?; // method
    write_u8_c(w, 1, &mut cksum)?; // level
    write_u32_c(w, flags.bits(), &mut cksum)?;
    write_u32_c(w, 0, &mut cksum)?; // file mode
    write_u32_c(w, 0, &mut cksum)?; // mtime low
    write_u32_c(w, 0, &mut cksum)?; // mtime high
    write_u8_c(w, name.len() as u8, &mut cksum)?;
    write_bytes_c(w, name, &mut cksum)?;

    write_u32(w, cksum.state()).map_err(LzopError::Io)?;

    Header {
        version: LZOP_VERSION,
        lib_version: LZO_LIB_VERSION,
        extract_version: LZO_LIB_VERSION,
        method: 1,
        level: 1,
        flags,
        filter: 0,
        file_mode: 0,
        mtime_low: 0,
        mtime_high: 0,
        name: name.to_vec(),
        extra: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Hand-assembles header bytes (version fixed at `LZOP_VERSION`, so the
    /// extract-version and level fields are always present) for tests that need
    /// to control fields `write_header` never varies, such as `method` or the
    /// extract-version value. The header checksum is left as zero; these tests
    /// all read with `verify: false`, so a mismatched checksum is irrelevant.
    fn build_header(method: u8, extract_version: u16, flags: Flags, name: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&LZOP_VERSION.to_be_bytes());
        buf.extend_from_slice(&LZO_LIB_VERSION.to_be_bytes());
        buf.extend_from_slice(&extract_version.to_be_bytes());
        buf.push(method);
        buf.push(1); // level
        buf.extend_from_slice(&flags.bits().to_be_bytes());
        if flags.contains(Flags::H_FILTER) {
            buf.extend_from_slice(&0u32.to_be_bytes()); // filter
        }
        buf.extend_from_slice(&0u32.to_be_bytes()); // file mode
        buf.extend_from_slice(&0u32.to_be_bytes()); // mtime low
        buf.extend_from_slice(&0u32.to_be_bytes()); // mtime high
        buf.push(name.len() as u8);
        buf.extend_from_slice(name);
        buf.extend_from_slice(&0u32.to_be_bytes()); // header checksum, unchecked
        buf
    }

    #[test]
    fn round_trips_default_header() {
        let mut buf = Vec::new();
        write_header(&mut buf, b"greeting.txt").unwrap();

        let mut cursor = Cursor::new(buf);
        let header = read_header(&mut cursor, true).unwrap();
        assert_eq!(header.version, LZOP_VERSION);
        assert_eq!(header.method, 1);
        assert_eq!(header.name, b"greeting.txt");
        assert!(header.flags.contains(Flags::ADLER32_D));
        assert!(header.flags.contains(Flags::ADLER32_C));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut cursor = Cursor::new(vec![0x00u8; 9]);
        assert!(matches!(read_magic(&mut cursor), Err(LzopError::BadMagic)));
    }

    #[test]
    fn accepts_good_magic() {
        let mut cursor = Cursor::new(MAGIC.to_vec());
        read_magic(&mut cursor).unwrap();
    }

    #[test]
    fn rejects_h_crc32() {
        let mut buf = Vec::new();
        write_header(&mut buf, b"x").unwrap();
        // Flags field starts right after version/libver/extract-version/method/level.
        let flags_offset = 2 + 2 + 2 + 1 + 1;
        let mut flags = u32::from_be_bytes(buf[flags_offset..flags_offset + 4].try_into().unwrap());
        flags |= Flags::H_CRC32.bits();
        buf[flags_offset..flags_offset + 4].copy_from_slice(&flags.to_be_bytes());

        let mut cursor = Cursor::new(buf);
        let result = read_header(&mut cursor, false);
        assert!(matches!(result, Err(LzopError::UnsupportedFeature(_))));
    }

    #[test]
    fn rejects_bad_method() {
        let buf = build_header(4, LZO_LIB_VERSION, Flags::ADLER32_D, b"x");
        let mut cursor = Cursor::new(buf);
        let result = read_header(&mut cursor, false);
        assert!(matches!(result, Err(LzopError::BadMethod(4))));
    }

    #[test]
    fn rejects_out_of_range_extract_version() {
        let buf = build_header(1, 0x0050, Flags::ADLER32_D, b"x");
        let mut cursor = Cursor::new(buf);
        let result = read_header(&mut cursor, false);
        assert!(matches!(result, Err(LzopError::UnsupportedVersion { found: 0x0050, .. })));
    }

    #[test]
    fn rejects_h_filter() {
        let buf = build_header(1, LZO_LIB_VERSION, Flags::ADLER32_D | Flags::H_FILTER, b"x");
        let mut cursor = Cursor::new(buf);
        let result = read_header(&mut cursor, false);
        assert!(matches!(result, Err(LzopError::UnsupportedFeature("H_FILTER"))));
    }

    #[test]
    fn rejects_multipart() {
        let buf = build_header(1, LZO_LIB_VERSION, Flags::ADLER32_D | Flags::MULTIPART, b"x");
        let mut cursor = Cursor::new(buf);
        let result = read_header(&mut cursor, false);
        assert!(matches!(result, Err(LzopError::UnsupportedFeature("MULTIPART"))));
    }

    #[test]
    fn detects_corrupted_checksum() {
        let mut buf = Vec::new();
        write_header(&mut buf, b"x").unwrap();
        let last = buf.len() - 1;
        buf[last] ^= 0xFF;

        let mut cursor = Cursor::new(buf);
        assert!(matches!(read_header(&mut cursor, true), Err(LzopError::ChecksumMismatch(_))));
    }

    #[test]
    fn name_too_long_is_rejected() {
        let mut buf = Vec::new();
        let name = vec![b'a'; 255];
        assert!(matches!(write_header(&mut buf, &name), Err(LzopError::NameTooLong(255))));
    }
}
