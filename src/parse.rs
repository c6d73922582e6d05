use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::SourceQueryError;

/// Sequential reader over one reply datagram.
///
/// Every read advances the offset by the width it consumed. A read that
/// would run past the end of the buffer fails with
/// [SourceQueryError::MalformedResponse] instead of returning garbage.
#[derive(Debug, Clone)]
pub struct BinaryCursor<T> {
    inner: Cursor<T>,
}

fn truncated(what: &'static str) -> impl FnOnce(std::io::Error) -> SourceQueryError {
    move |_| SourceQueryError::MalformedResponse(format!("reply truncated while reading {what}"))
}

impl<T: AsRef<[u8]>> BinaryCursor<T> {
    pub fn new(data: T) -> Self {
        BinaryCursor {
            inner: Cursor::new(data),
        }
    }

    /// Current read offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.inner.position() as usize
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.inner.get_ref().as_ref().len().saturating_sub(self.position())
    }

    /// Advance past `n` bytes without decoding them.
    pub fn skip(&mut self, n: usize) -> Result<(), SourceQueryError> {
        if n > self.remaining() {
            return Err(SourceQueryError::MalformedResponse(format!(
                "reply truncated: cannot skip {n} bytes, {} left",
                self.remaining()
            )));
        }
        self.inner.set_position((self.position() + n) as u64);
        Ok(())
    }

    pub fn byte(&mut self) -> Result<u8, SourceQueryError> {
        self.inner.read_u8().map_err(truncated("byte"))
    }

    pub fn short(&mut self) -> Result<u16, SourceQueryError> {
        self.inner.read_u16::<LittleEndian>().map_err(truncated("short"))
    }

    pub fn long(&mut self) -> Result<i32, SourceQueryError> {
        self.inner.read_i32::<LittleEndian>().map_err(truncated("long"))
    }

    pub fn long_long(&mut self) -> Result<i64, SourceQueryError> {
        self.inner
            .read_i64::<LittleEndian>()
            .map_err(truncated("long long"))
    }

    pub fn float(&mut self) -> Result<f32, SourceQueryError> {
        self.inner.read_f32::<LittleEndian>().map_err(truncated("float"))
    }

    /// Read a null-terminated UTF-8 string.
    ///
    /// The terminator is consumed but not returned. A missing terminator is
    /// treated as truncation.
    pub fn string(&mut self) -> Result<String, SourceQueryError> {
        let start = self.position();
        let data = self.inner.get_ref().as_ref();
        let rest = data.get(start..).unwrap_or_default();

        let len = rest.iter().position(|&c| c == 0).ok_or_else(|| {
            SourceQueryError::MalformedResponse(
                "reply truncated: string has no null terminator".to_owned(),
            )
        })?;
        let value = std::str::from_utf8(&rest[..len])?.to_owned();

        self.inner.set_position((start + len + 1) as u64);
        Ok(value)
    }

    /// Consume and return every byte left in the buffer.
    pub fn rest(&mut self) -> Vec<u8> {
        let start = self.position();
        let data = self.inner.get_ref().as_ref();
        let end = data.len();
        let rest = data.get(start..).unwrap_or_default().to_vec();
        self.inner.set_position(end as u64);
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_values_in_order() {
        let mut data = vec![0x7f];
        data.extend_from_slice(&0x1234u16.to_le_bytes());
        data.extend_from_slice(&(-5i32).to_le_bytes());
        data.extend_from_slice(&(-76561198000000000i64).to_le_bytes());
        data.extend_from_slice(&12.5f32.to_le_bytes());
        data.extend_from_slice(b"de_dust2\0");

        let mut cursor = BinaryCursor::new(data.as_slice());
        assert_eq!(cursor.byte().unwrap(), 0x7f);
        assert_eq!(cursor.short().unwrap(), 0x1234);
        assert_eq!(cursor.long().unwrap(), -5);
        assert_eq!(cursor.long_long().unwrap(), -76561198000000000);
        assert_eq!(cursor.float().unwrap().to_bits(), 12.5f32.to_bits());
        assert_eq!(cursor.string().unwrap(), "de_dust2");
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn empty_string_consumes_terminator() {
        let mut cursor = BinaryCursor::new(&b"\0\x09"[..]);
        assert_eq!(cursor.string().unwrap(), "");
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.byte().unwrap(), 9);
    }

    #[test]
    fn short_read_is_malformed() {
        let mut cursor = BinaryCursor::new(&[0x01u8, 0x02, 0x03][..]);
        assert!(matches!(
            cursor.long(),
            Err(SourceQueryError::MalformedResponse(_))
        ));
    }

    #[test]
    fn read_past_end_is_malformed() {
        let mut cursor = BinaryCursor::new(&[0x01u8][..]);
        cursor.byte().unwrap();
        assert!(matches!(
            cursor.byte(),
            Err(SourceQueryError::MalformedResponse(_))
        ));
        assert!(matches!(
            cursor.short(),
            Err(SourceQueryError::MalformedResponse(_))
        ));
    }

    #[test]
    fn unterminated_string_is_malformed() {
        let mut cursor = BinaryCursor::new(&b"host"[..]);
        assert!(matches!(
            cursor.string(),
            Err(SourceQueryError::MalformedResponse(_))
        ));
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let mut cursor = BinaryCursor::new(&[0xffu8, 0xfe, 0x00][..]);
        assert!(matches!(
            cursor.string(),
            Err(SourceQueryError::MalformedResponse(_))
        ));
    }

    #[test]
    fn skip_and_rest() {
        let mut cursor = BinaryCursor::new(vec![0xffu8, 0xff, 0xff, 0xff, 0x41, 1, 2, 3, 4]);
        cursor.skip(5).unwrap();
        assert_eq!(cursor.rest(), vec![1, 2, 3, 4]);
        assert_eq!(cursor.remaining(), 0);
        assert!(cursor.skip(1).is_err());
    }
}
