// src/probe.rs
//! Format detection for MMTP/TLV input.

use std::path::Path;

use crate::constants::{TLV_HEADER_SIZE, TLV_SYNC_BYTE};
use crate::types::TlvPacketType;

pub const EXTENSIONS: &[&str] = &["mmts", "tlvmmt"];
pub const PROBE_SCORE_MAX: u32 = 100;
pub const PROBE_SCORE_EXTENSION: u32 = 50;

/// Headers that must chain for a full score
const PROBE_MIN_PACKETS: usize = 4;

/// Scores how likely `buf` (the start of a stream) is TLV framed.
///
/// Headers are followed by their declared lengths from offset 0; each one
/// needs the sync byte and a known packet type.
pub fn probe(buf: &[u8]) -> u32 {
    let mut offset = 0;
    let mut chained = 0;
    while offset + TLV_HEADER_SIZE <= buf.len() {
        let hdr = &buf[offset..offset + TLV_HEADER_SIZE];
        if hdr[0] != TLV_SYNC_BYTE || TlvPacketType::from_u8(hdr[1]).is_none() {
            break;
        }
        chained += 1;
        if chained >= PROBE_MIN_PACKETS {
            return PROBE_SCORE_MAX;
        }
        offset += TLV_HEADER_SIZE + usize::from(u16::from_be_bytes([hdr[2], hdr[3]]));
    }

    match chained {
        0 => 0,
        // the buffer ended exactly on a packet boundary
        n if n >= 2 && offset == buf.len() => PROBE_SCORE_MAX,
        1 => 1,
        _ => PROBE_SCORE_EXTENSION / 2,
    }
}

/// Score from the file name alone.
pub fn probe_extension(path: &Path) -> u32 {
    let matches = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)));
    if matches { PROBE_SCORE_EXTENSION } else { 0 }
}
