//! Little-endian primitives over `Read` / `Write`.
//!
//! Every multi-byte field in the record and time logs goes through
//! these helpers. A short read surfaces as `UnexpectedEof`.

use std::io::{self, Read, Write};

pub fn read_u8<R: Read + ?Sized>(r: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn read_u16_le<R: Read + ?Sized>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub fn read_i16_le<R: Read + ?Sized>(r: &mut R) -> io::Result<i16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(i16::from_le_bytes(buf))
}

pub fn read_u32_le<R: Read + ?Sized>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn read_i32_le<R: Read + ?Sized>(r: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

pub fn write_u8<W: Write + ?Sized>(w: &mut W, v: u8) -> io::Result<()> {
    w.write_all(&[v])
}

pub fn write_u16_le<W: Write + ?Sized>(w: &mut W, v: u16) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

pub fn write_i16_le<W: Write + ?Sized>(w: &mut W, v: i16) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

pub fn write_u32_le<W: Write + ?Sized>(w: &mut W, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

pub fn write_i32_le<W: Write + ?Sized>(w: &mut W, v: i32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_little_endian() {
        let mut buf = Vec::new();
        write_u32_le(&mut buf, 0x0102_0304).unwrap();
        write_i16_le(&mut buf, -2).unwrap();
        assert_eq!(buf, [0x04, 0x03, 0x02, 0x01, 0xFE, 0xFF]);

        let mut cursor = buf.as_slice();
        assert_eq!(read_u32_le(&mut cursor).unwrap(), 0x0102_0304);
        assert_eq!(read_i16_le(&mut cursor).unwrap(), -2);
    }

    #[test]
    fn short_read_is_unexpected_eof() {
        let mut cursor: &[u8] = &[0x01, 0x02];
        let err = read_u32_le(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
