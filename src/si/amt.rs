// src/si/amt.rs
//! Address Mapping Table: service_id to IPv4/IPv6 source and destination ranges.

use super::bits::BitCursor;
use crate::constants::{AMT_MIN_SECTION_LENGTH, AMT_SERVICE_HEADER_SIZE};
use crate::error::SectionError;
use crate::types::{AmtAddress, AmtMapping, IpVersion};

/// Parses the AMT service loop; `c` sits right after last_section_number.
pub fn parse_amt(c: &mut BitCursor<'_>, section_length: usize) -> Result<Vec<AmtMapping>, SectionError> {
    if section_length < AMT_MIN_SECTION_LENGTH {
        return Err(SectionError::TooShort {
            what: "AMT section",
            need: AMT_MIN_SECTION_LENGTH,
            have: section_length,
        });
    }

    let num_of_service_id = c.read::<10, u16>()?;
    c.skip_bits(6)?;

    let mut min_len = AMT_MIN_SECTION_LENGTH;
    let mut services = Vec::with_capacity(usize::from(num_of_service_id));
    for index in 0..usize::from(num_of_service_id) {
        min_len += AMT_SERVICE_HEADER_SIZE;
        if min_len > section_length {
            return Err(SectionError::ServiceHeaderOverflow {
                index,
                need: min_len,
                section_length,
            });
        }

        let service_id = c.read::<16, u16>()?;
        let ip_version = if c.read_bit()? { IpVersion::V6 } else { IpVersion::V4 };
        c.skip_bits(5)?;
        let service_loop_length = usize::from(c.read::<10, u16>()?);

        min_len += service_loop_length;
        if min_len > section_length {
            return Err(SectionError::ServiceLoopOverflow {
                index,
                need: min_len,
                section_length,
            });
        }
        if service_loop_length < ip_version.record_size() {
            return Err(SectionError::AddressRecordTooShort {
                length: service_loop_length,
                min: ip_version.record_size(),
            });
        }

        let record = c.peek_bytes(service_loop_length)?;
        services.push(read_record(service_id, ip_version, record)?);
        // anything past the address record is reserved
        c.skip_bytes(service_loop_length)?;
    }

    Ok(services)
}

fn read_record(
    service_id: u16,
    ip_version: IpVersion,
    record: &[u8],
) -> Result<AmtMapping, SectionError> {
    let mut r = BitCursor::new(record);
    let (src_address, src_mask, dst_address, dst_mask) = match ip_version {
        IpVersion::V4 => (
            AmtAddress::V4(r.take_bytes::<4>()?),
            r.read::<8, u8>()?,
            AmtAddress::V4(r.take_bytes::<4>()?),
            r.read::<8, u8>()?,
        ),
        IpVersion::V6 => (
            AmtAddress::V6(r.take_bytes::<16>()?),
            r.read::<8, u8>()?,
            AmtAddress::V6(r.take_bytes::<16>()?),
            r.read::<8, u8>()?,
        ),
    };

    Ok(AmtMapping {
        service_id,
        ip_version,
        src_address,
        src_mask,
        dst_address,
        dst_mask,
    })
}
