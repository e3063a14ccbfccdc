// src/si/extended.rs
//! Extended tables (table_id 0xFE), keyed by table_id_extension.

use super::amt;
use super::bits::BitCursor;
use crate::error::SectionError;
use crate::types::{ExtensionId, SectionBody};

pub fn parse_extended(
    c: &mut BitCursor<'_>,
    section_length: usize,
    table_id_extension: u16,
) -> Result<SectionBody, SectionError> {
    match ExtensionId::from(table_id_extension) {
        ExtensionId::Amt => Ok(SectionBody::Amt {
            services: amt::parse_amt(c, section_length)?,
        }),
        ExtensionId::Unknown(raw) => Err(SectionError::UnknownExtension(raw)),
    }
}
