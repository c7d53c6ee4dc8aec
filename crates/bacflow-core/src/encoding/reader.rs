use crate::DecodeError;

/// A cursor over a received frame. Reads past the end fail with
/// [`DecodeError::MalformedFrame`] and leave the position unchanged.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub const fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn peek_u8(&self) -> Result<u8, DecodeError> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or(DecodeError::MalformedFrame)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let byte = self.peek_u8()?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_exact(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(DecodeError::MalformedFrame)?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Everything not yet read; the reader is left empty.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = self.buf.get(self.pos..).unwrap_or_default();
        self.pos = self.buf.len();
        rest
    }

    pub fn read_be_u16(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.read_exact(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_be_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.read_exact(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

#[cfg(test)]
mod tests {
    use super::Reader;
    use crate::DecodeError;

    #[test]
    fn bvlc_header_fields() {
        let mut r = Reader::new(&[0x81, 0x0A, 0x00, 0x11, 0x01, 0x04]);
        assert_eq!(r.read_u8().unwrap(), 0x81);
        assert_eq!(r.read_u8().unwrap(), 0x0A);
        assert_eq!(r.read_be_u16().unwrap(), 0x11);
        assert_eq!(r.read_rest(), &[0x01, 0x04]);
        assert!(r.is_empty());
        assert_eq!(r.read_rest(), &[] as &[u8]);
    }

    #[test]
    fn short_read_keeps_position() {
        let mut r = Reader::new(&[1, 2, 3]);
        assert_eq!(r.read_u8().unwrap(), 1);
        assert_eq!(r.read_be_u32().unwrap_err(), DecodeError::MalformedFrame);
        assert_eq!(r.position(), 1);
        assert_eq!(r.read_exact(usize::MAX).unwrap_err(), DecodeError::MalformedFrame);
        assert_eq!(r.read_exact(2).unwrap(), &[2, 3]);
    }
}
