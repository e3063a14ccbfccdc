// src/resync.rs
//! Recovers TLV framing after corruption or a seek.

use log::error;

use crate::constants::TLV_SYNC_BYTE;
use crate::error::TlvError;
use crate::source::ByteSource;

/// Scans for the sync byte, reading at most `limit` bytes.
///
/// On success the source is left on the sync byte and the number of bytes
/// discarded before it is returned.
pub fn resync<S: ByteSource + ?Sized>(src: &mut S, limit: u32) -> Result<u64, TlvError> {
    for scanned in 0..u64::from(limit) {
        match src.read_u8()? {
            None => return Err(TlvError::EndOfStream),
            Some(TLV_SYNC_BYTE) => {
                src.rewind_one()?;
                return Ok(scanned);
            }
            Some(_) => {}
        }
    }

    error!("TLV resync failed to find TLV sync byte in {limit} bytes");
    Err(TlvError::SyncNotFound {
        scanned: u64::from(limit),
    })
}
