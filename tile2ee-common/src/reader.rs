//! A bounds-checked, little-endian cursor over a borrowed byte slice.
//!
//! Shaped like `hayro-jbig2::reader::Reader` / `hayro-jpeg2000::reader::BitReader`,
//! but little-endian throughout since every integer on disk in a TIS/MOS/PVRZ
//! file is little-endian (spec §6).

/// A little-endian reader over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct LeReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> LeReader<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Seeks to an absolute offset. Returns `None` if `pos` is past the end.
    #[inline]
    pub fn seek_abs(&mut self, pos: usize) -> Option<()> {
        if pos > self.data.len() {
            return None;
        }
        self.pos = pos;
        Some(())
    }

    /// Seeks by a signed relative offset.
    #[inline]
    pub fn seek_rel(&mut self, delta: isize) -> Option<()> {
        let new_pos = self.pos.checked_add_signed(delta)?;
        self.seek_abs(new_pos)
    }

    /// Seeks to the end of the buffer.
    #[inline]
    pub fn seek_end(&mut self) {
        self.pos = self.data.len();
    }

    #[inline]
    pub fn peek_bytes(&self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        self.data.get(self.pos..end)
    }

    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let bytes = self.peek_bytes(len)?;
        self.pos += len;
        Some(bytes)
    }

    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Some(out)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Option<u8> {
        let bytes = self.read_bytes(1)?;
        Some(bytes[0])
    }

    #[inline]
    pub fn read_u16(&mut self) -> Option<u16> {
        self.read_array::<2>().map(u16::from_le_bytes)
    }

    #[inline]
    pub fn read_u32(&mut self) -> Option<u32> {
        self.read_array::<4>().map(u32::from_le_bytes)
    }

    #[inline]
    pub fn read_i32(&mut self) -> Option<i32> {
        self.read_array::<4>().map(i32::from_le_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_integers() {
        let data = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00];
        let mut r = LeReader::new(&data);
        assert_eq!(r.read_u16(), Some(1));
        assert_eq!(r.read_u32(), Some(2));
        assert!(r.at_end());
    }

    #[test]
    fn out_of_bounds_reads_return_none() {
        let data = [0u8; 3];
        let mut r = LeReader::new(&data);
        assert_eq!(r.read_u32(), None);
        assert_eq!(r.offset(), 0);
    }

    #[test]
    fn seek_absolute_and_relative() {
        let data = [0u8; 10];
        let mut r = LeReader::new(&data);
        assert!(r.seek_abs(4).is_some());
        assert_eq!(r.offset(), 4);
        assert!(r.seek_rel(-2).is_some());
        assert_eq!(r.offset(), 2);
        assert!(r.seek_rel(-10).is_none());
        assert!(r.seek_abs(11).is_none());
    }
}
