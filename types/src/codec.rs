//! Codec helpers for field types commonware-codec has no native impl for.

use bytes::{Buf, BufMut};
use commonware_codec::{Error, ReadExt, Write};

/// Write a string as length-prefixed UTF-8.
pub fn write_string(s: &str, writer: &mut impl BufMut) {
    (s.len() as u32).write(writer);
    writer.put_slice(s.as_bytes());
}

/// Read a length-prefixed UTF-8 string, rejecting lengths over `max_len`.
pub fn read_string(reader: &mut impl Buf, max_len: usize) -> Result<String, Error> {
    let len = u32::read(reader)? as usize;
    if len > max_len {
        return Err(Error::Invalid("String", "too long"));
    }
    if reader.remaining() < len {
        return Err(Error::EndOfBuffer);
    }
    let bytes = reader.copy_to_bytes(len);
    String::from_utf8(bytes.to_vec()).map_err(|_| Error::Invalid("String", "invalid UTF-8"))
}

/// Encoded size of a length-prefixed string.
pub fn string_encode_size(s: &str) -> usize {
    4 + s.len()
}

/// Write an f64 through its bit pattern (win rates, tier multipliers).
pub fn write_f64(value: f64, writer: &mut impl BufMut) {
    value.to_bits().write(writer);
}

/// Read an f64 written by [`write_f64`].
pub fn read_f64(reader: &mut impl Buf) -> Result<f64, Error> {
    Ok(f64::from_bits(u64::read(reader)?))
}
