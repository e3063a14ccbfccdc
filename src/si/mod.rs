// src/si/mod.rs
//! Signalling tables carried in TLV type 0xFE packets.

pub mod amt;
pub mod bits;
pub mod extended;
pub mod nit;
pub mod section;

#[cfg(test)]
pub(crate) mod testutil;

pub use section::parse_section;

use bytes::Bytes;

use crate::error::SectionError;
use bits::BitCursor;

/// Zero-copy view of the next `len` bytes of `region`, skipping the cursor past them.
pub(crate) fn take_range(
    c: &mut BitCursor<'_>,
    region: &Bytes,
    len: usize,
) -> Result<Bytes, SectionError> {
    let offset = c.byte_offset()?;
    c.peek_bytes(len)?;
    c.skip_bytes(len)?;
    Ok(region.slice(offset..offset + len))
}
