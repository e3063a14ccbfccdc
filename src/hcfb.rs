// src/hcfb.rs
//! Header Compression for Broadcast (TLV type 0x03) context header.

use crate::constants::HCFB_HEADER_SIZE;
use crate::error::SectionError;
use crate::si::bits::BitCursor;
use crate::types::HcfbHeader;

/// 12-bit context id, 4-bit sequence number, 8-bit context header type.
pub fn parse_hcfb(payload: &[u8]) -> Result<HcfbHeader, SectionError> {
    if payload.len() < HCFB_HEADER_SIZE {
        return Err(SectionError::TooShort {
            what: "HCfB packet",
            need: HCFB_HEADER_SIZE,
            have: payload.len(),
        });
    }
    let mut c = BitCursor::new(&payload[..HCFB_HEADER_SIZE]);
    Ok(HcfbHeader {
        context_id: c.read::<12, u16>()?,
        sequence_number: c.read::<4, u8>()?,
        context_header_type: c.read::<8, u8>()?,
    })
}
