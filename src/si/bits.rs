// src/si/bits.rs
//! Bounded bit cursor over a section, built on bitstream-io.

use bitstream_io::{BigEndian, BitRead, BitReader, Integer};

use crate::error::SectionError;

/// MSB-first bit reader that also knows its byte offset in the backing slice.
pub struct BitCursor<'a> {
    br: BitReader<&'a [u8], BigEndian>,
    buf: &'a [u8],
    bits: u64,
}

impl<'a> BitCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            br: BitReader::endian(buf, BigEndian),
            buf,
            bits: 0,
        }
    }

    pub fn read<const BITS: u32, U: Integer>(&mut self) -> Result<U, SectionError> {
        let v = self.br.read::<BITS, U>().map_err(|_| SectionError::Truncated)?;
        self.bits += u64::from(BITS);
        Ok(v)
    }

    pub fn read_bit(&mut self) -> Result<bool, SectionError> {
        let v = self.br.read_bit().map_err(|_| SectionError::Truncated)?;
        self.bits += 1;
        Ok(v)
    }

    pub fn skip_bits(&mut self, n: u32) -> Result<(), SectionError> {
        self.br.skip(n).map_err(|_| SectionError::Truncated)?;
        self.bits += u64::from(n);
        Ok(())
    }

    pub fn skip_bytes(&mut self, n: usize) -> Result<(), SectionError> {
        let bits = u32::try_from(n * 8).map_err(|_| SectionError::Truncated)?;
        self.skip_bits(bits)
    }

    pub fn byte_offset(&self) -> Result<usize, SectionError> {
        if self.bits % 8 != 0 {
            return Err(SectionError::Misaligned(self.bits));
        }
        Ok((self.bits / 8) as usize)
    }

    /// Borrows the next `len` bytes of the backing slice without moving the cursor.
    pub fn peek_bytes(&self, len: usize) -> Result<&'a [u8], SectionError> {
        let offset = self.byte_offset()?;
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(SectionError::OutOfBounds {
                offset,
                len,
                limit: self.buf.len(),
            })?;
        Ok(&self.buf[offset..end])
    }

    /// Copies `N` bytes straight out of the backing slice at the current
    /// byte offset, then moves the bit reader past them.
    pub fn take_bytes<const N: usize>(&mut self) -> Result<[u8; N], SectionError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.peek_bytes(N)?);
        self.skip_bytes(N)?;
        Ok(out)
    }
}
