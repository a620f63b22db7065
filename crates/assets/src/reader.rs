//! Sequential little-endian stream primitives shared by the model and
//! material parsers.

use std::io::{ErrorKind, Read};

use crate::error::ReadError;

/// Longest name the formats allow, terminator excluded.
pub const MAX_NAME_LEN: usize = 254;

/// Result of reading a null-terminated string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStr {
    /// The terminator was found; it is not part of the string.
    Terminated(String),
    /// The size bound was hit before any terminator.
    Bounded(String),
}

/// Forward-only reader that tracks its byte offset for diagnostics.
pub struct ByteReader<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn eof(&self) -> ReadError {
        ReadError::UnexpectedEof {
            offset: self.offset,
        }
    }

    /// One byte, or `None` at end of stream.
    fn next_byte(&mut self) -> Result<Option<u8>, ReadError> {
        let mut b = [0u8; 1];
        loop {
            match self.inner.read(&mut b) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.offset += 1;
                    return Ok(Some(b[0]));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ReadError> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.offset += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(self.eof()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ReadError> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32, ReadError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, ReadError> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Read exactly `len` bytes without trusting `len` for the allocation.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, ReadError> {
        let mut buf = Vec::new();
        let got = (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        self.offset += got as u64;
        if got < len {
            return Err(self.eof());
        }
        Ok(buf)
    }

    /// Read a null-terminated string of at most `max_len` bytes.
    ///
    /// Bytes are consumed one at a time up to and including the terminator,
    /// so the stream is left right after it. End of stream is an error even
    /// when some bytes were read; an empty terminated string is not.
    pub fn read_cstr(&mut self, max_len: usize) -> Result<ReadStr, ReadError> {
        let mut bytes = Vec::new();
        while bytes.len() < max_len {
            match self.next_byte()? {
                None => return Err(self.eof()),
                Some(0) => {
                    return Ok(ReadStr::Terminated(
                        String::from_utf8_lossy(&bytes).into_owned(),
                    ));
                }
                Some(b) => bytes.push(b),
            }
        }
        Ok(ReadStr::Bounded(String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Like [`read_cstr`](Self::read_cstr), rejecting strings that hit the bound.
    pub fn read_name(&mut self, max_len: usize) -> Result<String, ReadError> {
        let start = self.offset;
        match self.read_cstr(max_len)? {
            ReadStr::Terminated(s) => Ok(s),
            ReadStr::Bounded(_) => Err(ReadError::Unterminated {
                offset: start,
                max: max_len,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cstr_stops_at_terminator() {
        let mut r = ByteReader::new(&b"cube\0rest"[..]);
        assert_eq!(r.read_cstr(MAX_NAME_LEN).unwrap(), ReadStr::Terminated("cube".into()));
        assert_eq!(r.offset(), 5);
        assert_eq!(r.read_array::<4>().unwrap(), *b"rest");
    }

    #[test]
    fn empty_terminated_string_is_not_eof() {
        let mut r = ByteReader::new(&b"\0"[..]);
        assert_eq!(r.read_cstr(MAX_NAME_LEN).unwrap(), ReadStr::Terminated(String::new()));

        let mut r = ByteReader::new(&b""[..]);
        assert!(matches!(
            r.read_cstr(MAX_NAME_LEN),
            Err(ReadError::UnexpectedEof { offset: 0 })
        ));
    }

    #[test]
    fn eof_before_terminator_is_an_error() {
        let mut r = ByteReader::new(&b"abc"[..]);
        assert!(matches!(
            r.read_cstr(MAX_NAME_LEN),
            Err(ReadError::UnexpectedEof { offset: 3 })
        ));
    }

    #[test]
    fn bound_without_terminator() {
        let mut r = ByteReader::new(&b"abcdef\0"[..]);
        assert_eq!(r.read_cstr(4).unwrap(), ReadStr::Bounded("abcd".into()));
        assert_eq!(r.offset(), 4);

        let mut r = ByteReader::new(&b"abcdef\0"[..]);
        assert!(matches!(
            r.read_name(4),
            Err(ReadError::Unterminated { offset: 0, max: 4 })
        ));
    }

    #[test]
    fn little_endian_scalars() {
        let mut data = Vec::new();
        data.push(7u8);
        data.extend_from_slice(&0x0102_0304u32.to_le_bytes());
        data.extend_from_slice(&1.5f32.to_le_bytes());
        let mut r = ByteReader::new(&data[..]);
        assert_eq!(r.read_u8().unwrap(), 7);
        assert_eq!(r.read_u32().unwrap(), 0x0102_0304);
        assert_eq!(r.read_f32().unwrap(), 1.5);
        assert_eq!(r.offset(), 9);
        assert!(matches!(r.read_u8(), Err(ReadError::UnexpectedEof { offset: 9 })));
    }

    #[test]
    fn read_bytes_reports_truncation() {
        let mut r = ByteReader::new(&[1u8, 2, 3][..]);
        assert!(matches!(
            r.read_bytes(usize::MAX),
            Err(ReadError::UnexpectedEof { offset: 3 })
        ));

        let mut r = ByteReader::new(&[1u8, 2, 3][..]);
        assert_eq!(r.read_bytes(2).unwrap(), vec![1, 2]);
    }
}
