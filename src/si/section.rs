// src/si/section.rs
//! Common section header shared by every signalling table, and table-id dispatch.

use bytes::Bytes;
use crc::{Crc, CRC_32_MPEG_2};
use log::debug;

use super::bits::BitCursor;
use super::{extended, nit};
use crate::constants::{SECTION_CRC_SIZE, SECTION_HEADER_SIZE, SECTION_MIN_PAYLOAD};
use crate::error::SectionError;
use crate::types::{SectionBody, SignallingSection, TableId};

const CRC_MPEG: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// Decodes one signalling section from a TLV signalling payload.
///
/// `section_length` is checked against the physical payload before anything
/// else reads it; every table parser uses it as its budget ceiling and only
/// ever sees the first `3 + section_length` bytes.
pub fn parse_section(payload: &Bytes, verify_crc: bool) -> Result<SignallingSection, SectionError> {
    if payload.len() < SECTION_MIN_PAYLOAD {
        return Err(SectionError::TooShort {
            what: "signalling section",
            need: SECTION_MIN_PAYLOAD,
            have: payload.len(),
        });
    }

    let mut head = BitCursor::new(&payload[..SECTION_HEADER_SIZE]);
    let table_id = head.read::<8, u8>()?;
    let section_syntax_indicator = head.read_bit()?;
    head.skip_bits(3)?;
    let section_length = head.read::<12, u16>()?;

    let available = payload.len() - SECTION_HEADER_SIZE;
    if usize::from(section_length) > available {
        return Err(SectionError::SectionLengthOverflow {
            section_length: usize::from(section_length),
            available,
        });
    }

    let region = payload.slice(..SECTION_HEADER_SIZE + usize::from(section_length));
    if verify_crc {
        check_crc(&region)?;
    }

    let mut c = BitCursor::new(&region);
    c.skip_bytes(SECTION_HEADER_SIZE)?;
    let table_id_extension = c.read::<16, u16>()?;
    c.skip_bits(2)?;
    let version_number = c.read::<5, u8>()?;
    let current_next_indicator = c.read_bit()?;
    let section_number = c.read::<8, u8>()?;
    let last_section_number = c.read::<8, u8>()?;

    let table_id = TableId::from(table_id);
    debug!(
        "section {table_id:?} ext=0x{table_id_extension:04X} v{version_number} \
         {section_number}/{last_section_number} len={section_length}"
    );

    let section_length_usize = usize::from(section_length);
    let body = match table_id {
        TableId::NitActual | TableId::NitOther => SectionBody::Nit(nit::parse_nit(
            &mut c,
            &region,
            section_length_usize,
            table_id_extension,
        )?),
        TableId::Extended => {
            extended::parse_extended(&mut c, section_length_usize, table_id_extension)?
        }
        TableId::Unknown(raw) => return Err(SectionError::UnknownTableId(raw)),
    };

    Ok(SignallingSection {
        table_id,
        section_syntax_indicator,
        section_length,
        table_id_extension,
        version_number,
        current_next_indicator,
        section_number,
        last_section_number,
        body,
    })
}

fn check_crc(region: &[u8]) -> Result<(), SectionError> {
    if region.len() < SECTION_HEADER_SIZE + SECTION_CRC_SIZE {
        return Err(SectionError::TooShort {
            what: "CRC-protected section",
            need: SECTION_HEADER_SIZE + SECTION_CRC_SIZE,
            have: region.len(),
        });
    }
    let (data, tail) = region.split_at(region.len() - SECTION_CRC_SIZE);
    let computed = CRC_MPEG.checksum(data);
    let carried = u32::from_be_bytes([tail[0], tail[1], tail[2], tail[3]]);
    if computed != carried {
        return Err(SectionError::CrcMismatch { computed, carried });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::si::testutil::{amt_body, nit_body, section, v4_record};
    use proptest::prelude::*;

    #[test]
    fn rejects_payload_under_twelve_bytes() {
        let p = Bytes::from_static(&[0x40, 0xB0, 0x08, 0, 0, 0xC1, 0, 0, 0, 0, 0]);
        assert_eq!(
            parse_section(&p, false).unwrap_err(),
            SectionError::TooShort {
                what: "signalling section",
                need: 12,
                have: 11
            }
        );
    }

    #[test]
    fn decodes_common_header() {
        let mut raw = section(0x40, 0x0004, &nit_body(&[], &[(1, 4, vec![])]));
        raw[5] = 0xC0 | (7 << 1) | 1; // version 7, current
        raw[6] = 2;
        raw[7] = 3;
        let s = parse_section(&Bytes::from(raw), false).unwrap();
        assert_eq!(s.table_id, TableId::NitActual);
        assert!(s.section_syntax_indicator);
        assert_eq!(s.table_id_extension, 0x0004);
        assert_eq!(s.version_number, 7);
        assert!(s.current_next_indicator);
        assert_eq!(s.section_number, 2);
        assert_eq!(s.last_section_number, 3);
    }

    #[test]
    fn nit_other_dispatches_to_nit() {
        let raw = section(0x41, 0x0009, &nit_body(&[], &[]));
        let s = parse_section(&Bytes::from(raw), false).unwrap();
        assert_eq!(s.table_id, TableId::NitOther);
        assert!(matches!(s.body, SectionBody::Nit(ref n) if n.network_id == 9));
    }

    #[test]
    fn extended_dispatches_to_amt() {
        let raw = section(0xFE, 0x0000, &amt_body(&[(0x0401, false, v4_record())]));
        let s = parse_section(&Bytes::from(raw), false).unwrap();
        match s.body {
            SectionBody::Amt { services } => assert_eq!(services.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_table_id_is_reported() {
        let raw = section(0x42, 0x0001, &[0u8; 8]);
        assert_eq!(
            parse_section(&Bytes::from(raw), false).unwrap_err(),
            SectionError::UnknownTableId(0x42)
        );
    }

    #[test]
    fn crc_checked_only_on_request() {
        let mut raw = section(0x40, 0x0001, &nit_body(&[], &[]));
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        let p = Bytes::from(raw);
        assert!(parse_section(&p, false).is_ok());
        assert!(matches!(
            parse_section(&p, true),
            Err(SectionError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn valid_crc_passes() {
        let raw = section(0x40, 0x0001, &nit_body(&[0x40, 0x00], &[]));
        assert!(parse_section(&Bytes::from(raw), true).is_ok());
    }

    #[test]
    fn trailing_bytes_after_section_are_ignored() {
        let mut raw = section(0x40, 0x0001, &nit_body(&[], &[(1, 1, vec![])]));
        raw.extend_from_slice(&[0xFF; 7]);
        assert!(parse_section(&Bytes::from(raw), true).is_ok());
    }

    proptest! {
        #[test]
        fn section_length_never_exceeds_payload(
            body in prop::collection::vec(any::<u8>(), 12..256),
            excess in 1usize..4096,
        ) {
            let mut raw = body;
            let section_length = raw.len() - 3 + excess;
            prop_assume!(section_length <= 0x0FFF);
            raw[1] = (raw[1] & 0xF0) | ((section_length >> 8) as u8 & 0x0F);
            raw[2] = section_length as u8;
            let available = raw.len() - 3;

            let err = parse_section(&Bytes::from(raw), false).unwrap_err();
            prop_assert_eq!(err, SectionError::SectionLengthOverflow { section_length, available });
        }
    }
}
