//! Little-endian primitive codecs for fixed-layout payload structs.
//!
//! Multi-byte numeric fields are little-endian (§4.1); strings are
//! fixed-width, NUL-terminated within their buffer.

use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{Error, Result};

/// Writes `s` into a newly allocated `width`-byte buffer, NUL-padded.
///
/// Fails if `s` (plus its terminating NUL) does not fit in `width` bytes.
pub fn write_fixed_str(s: &str, width: usize) -> Result<Vec<u8>> {
    let bytes = s.as_bytes();
    if bytes.len() + 1 > width {
        return Err(Error::StringTooLong { max: width, got: bytes.len() });
    }
    let mut buf = vec![0u8; width];
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(buf)
}

/// Reads a NUL-terminated UTF-8 string out of a fixed-width field.
pub fn read_fixed_str(field: &[u8]) -> Result<String> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    std::str::from_utf8(&field[..end]).map(str::to_owned).map_err(|_| Error::InvalidUtf8)
}

/// Appends a fixed-width, NUL-padded string to `out`.
pub fn put_fixed_str(out: &mut Vec<u8>, s: &str, width: usize) -> Result<()> {
    out.extend_from_slice(&write_fixed_str(s, width)?);
    Ok(())
}

/// Reads exactly `width` bytes from `cursor` and decodes them as a
/// NUL-terminated string.
pub fn get_fixed_str(cursor: &mut Cursor<&[u8]>, width: usize) -> Result<String> {
    let mut buf = vec![0u8; width];
    cursor.read_exact(&mut buf)?;
    read_fixed_str(&buf)
}

/// Reads a little-endian `u32`.
pub fn get_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32> {
    Ok(cursor.read_u32::<LittleEndian>()?)
}

/// Reads a little-endian `i32`.
pub fn get_i32(cursor: &mut Cursor<&[u8]>) -> Result<i32> {
    Ok(cursor.read_i32::<LittleEndian>()?)
}

/// Reads a little-endian `u64`.
pub fn get_u64(cursor: &mut Cursor<&[u8]>) -> Result<u64> {
    Ok(cursor.read_u64::<LittleEndian>()?)
}

/// Reads a little-endian `i64`.
pub fn get_i64(cursor: &mut Cursor<&[u8]>) -> Result<i64> {
    Ok(cursor.read_i64::<LittleEndian>()?)
}

/// Reads a single byte as a `bool` (`0` = false, anything else = true).
pub fn get_bool(cursor: &mut Cursor<&[u8]>) -> Result<bool> {
    Ok(cursor.read_u8()? != 0)
}

/// Appends a little-endian `u32`.
pub fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.write_u32::<LittleEndian>(v).expect("Vec<u8> writes are infallible");
}

/// Appends a little-endian `i32`.
pub fn put_i32(out: &mut Vec<u8>, v: i32) {
    out.write_i32::<LittleEndian>(v).expect("Vec<u8> writes are infallible");
}

/// Appends a little-endian `u64`.
pub fn put_u64(out: &mut Vec<u8>, v: u64) {
    out.write_u64::<LittleEndian>(v).expect("Vec<u8> writes are infallible");
}

/// Appends a little-endian `i64`.
pub fn put_i64(out: &mut Vec<u8>, v: i64) {
    out.write_i64::<LittleEndian>(v).expect("Vec<u8> writes are infallible");
}

/// Appends a single byte encoding `v`.
pub fn put_bool(out: &mut Vec<u8>, v: bool) {
    out.write_u8(v as u8).expect("Vec<u8> writes are infallible");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_str_round_trips() {
        let buf = write_fixed_str("alice", 64).unwrap();
        assert_eq!(buf.len(), 64);
        assert_eq!(read_fixed_str(&buf).unwrap(), "alice");
    }

    #[test]
    fn fixed_str_rejects_overflow() {
        assert!(write_fixed_str("this name is definitely too long", 8).is_err());
    }

    #[test]
    fn numeric_round_trips_via_cursor() {
        let mut out = Vec::new();
        put_u32(&mut out, 0xdead_beef);
        put_i64(&mut out, -7);
        put_bool(&mut out, true);
        let mut cur = Cursor::new(out.as_slice());
        assert_eq!(get_u32(&mut cur).unwrap(), 0xdead_beef);
        assert_eq!(get_i64(&mut cur).unwrap(), -7);
        assert!(get_bool(&mut cur).unwrap());
    }
}
