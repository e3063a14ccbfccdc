// src/si/nit.rs
//! Network Information Table (table_id 0x40 actual / 0x41 other).

use bytes::Bytes;

use super::bits::BitCursor;
use super::take_range;
use crate::constants::{NIT_MAX_SECTION_LENGTH, NIT_MIN_SECTION_LENGTH, NIT_STREAM_ENTRY_SIZE};
use crate::error::SectionError;
use crate::types::{NitBody, NitStream};

/// Parses the NIT body; `c` sits right after last_section_number.
///
/// Every length is checked against what is left of its enclosing budget
/// before it is consumed, and an entry that does not fit aborts the table.
pub fn parse_nit(
    c: &mut BitCursor<'_>,
    region: &Bytes,
    section_length: usize,
    network_id: u16,
) -> Result<NitBody, SectionError> {
    if section_length < NIT_MIN_SECTION_LENGTH {
        return Err(SectionError::TooShort {
            what: "NIT section",
            need: NIT_MIN_SECTION_LENGTH,
            have: section_length,
        });
    }
    if section_length > NIT_MAX_SECTION_LENGTH {
        return Err(SectionError::NitSectionTooLong(section_length));
    }
    let mut min_len = NIT_MIN_SECTION_LENGTH;

    c.skip_bits(4)?; // reserved_future_use
    let network_descriptors_length = usize::from(c.read::<12, u16>()? & 0x3FF);
    if network_descriptors_length > section_length - min_len {
        return Err(SectionError::NetworkDescriptorsOverflow {
            length: network_descriptors_length,
            budget: section_length - min_len,
        });
    }
    min_len += network_descriptors_length;
    let network_descriptors = take_range(c, region, network_descriptors_length)?;

    c.skip_bits(4)?;
    let tlv_stream_loop_length = usize::from(c.read::<12, u16>()? & 0x3FF);
    if tlv_stream_loop_length > section_length - min_len {
        return Err(SectionError::StreamLoopOverflow {
            length: tlv_stream_loop_length,
            budget: section_length - min_len,
        });
    }

    let mut remaining = tlv_stream_loop_length;
    let mut streams = Vec::new();
    while remaining >= NIT_STREAM_ENTRY_SIZE {
        let tlv_stream_id = c.read::<16, u16>()?;
        let original_network_id = c.read::<16, u16>()?;
        c.skip_bits(4)?;
        let descriptors_length = usize::from(c.read::<12, u16>()? & 0x3FF);

        let need = NIT_STREAM_ENTRY_SIZE + descriptors_length;
        if remaining < need {
            return Err(SectionError::EntryOverflow { need, remaining });
        }
        let descriptors = take_range(c, region, descriptors_length)?;
        remaining -= need;

        streams.push(NitStream {
            tlv_stream_id,
            original_network_id,
            descriptors,
        });
    }
    // strict accounting: entries must sum to tlv_stream_loop_length, so
    // 1..=5 leftover bytes are rejected rather than ending the loop quietly
    if remaining != 0 {
        return Err(SectionError::StreamLoopResidue(remaining));
    }

    Ok(NitBody {
        network_id,
        network_descriptors,
        streams,
    })
}
