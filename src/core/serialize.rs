// Wire encoding helpers

use std::io::{self, Write};

/// Write a variable-length integer (VarInt)
pub fn write_varint<W: Write>(writer: &mut W, value: u64) -> io::Result<()> {
    match value {
        0..=0xfc => writer.write_all(&[value as u8]),
        0xfd..=0xffff => {
            writer.write_all(&[0xfd])?;
            writer.write_all(&(value as u16).to_le_bytes())
        }
        0x10000..=0xffff_ffff => {
            writer.write_all(&[0xfe])?;
            writer.write_all(&(value as u32).to_le_bytes())
        }
        _ => {
            writer.write_all(&[0xff])?;
            writer.write_all(&value.to_le_bytes())
        }
    }
}

/// Write bytes with a VarInt length prefix
pub fn write_var_bytes<W: Write>(writer: &mut W, data: &[u8]) -> io::Result<()> {
    write_varint(writer, data.len() as u64)?;
    writer.write_all(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varint(value: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        write_varint(&mut buf, value).unwrap();
        buf
    }

    #[test]
    fn test_varint_widths() {
        assert_eq!(varint(100), vec![100]);
        assert_eq!(varint(0xfc), vec![0xfc]);
        assert_eq!(varint(0xfd), vec![0xfd, 0xfd, 0x00]);
        assert_eq!(varint(100_000), vec![0xfe, 0xa0, 0x86, 0x01, 0x00]);
        assert_eq!(varint(u64::MAX).len(), 9);
    }

    #[test]
    fn test_var_bytes() {
        let mut buf = Vec::new();
        write_var_bytes(&mut buf, b"banks").unwrap();
        assert_eq!(buf, b"\x05banks".to_vec());
    }
}
