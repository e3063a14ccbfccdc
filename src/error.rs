// src/error.rs
//! Error types for TLV framing and signalling table decoding.

use std::io;

use thiserror::Error;

/// Structural validation errors raised while decoding one packet's payload.
///
/// By the time one of these is returned the packet has been fully consumed
/// from the stream, so the read loop can continue with the next packet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SectionError {
    #[error("{what} too short: need {need} bytes, have {have}")]
    TooShort {
        what: &'static str,
        need: usize,
        have: usize,
    },

    #[error("section_length {section_length} exceeds the {available} bytes left in the packet")]
    SectionLengthOverflow {
        section_length: usize,
        available: usize,
    },

    #[error("NIT section_length {0} exceeds 1021")]
    NitSectionTooLong(usize),

    #[error("unknown table_id 0x{0:02X}")]
    UnknownTableId(u8),

    #[error("network_descriptors_length {length} exceeds budget {budget}")]
    NetworkDescriptorsOverflow { length: usize, budget: usize },

    #[error("tlv_stream_loop_length {length} exceeds budget {budget}")]
    StreamLoopOverflow { length: usize, budget: usize },

    #[error("TLV stream entry needs {need} bytes, only {remaining} left in the loop")]
    EntryOverflow { need: usize, remaining: usize },

    #[error("{0} bytes left over at the end of the TLV stream loop")]
    StreamLoopResidue(usize),

    #[error("unknown table_id_extension 0x{0:04X}")]
    UnknownExtension(u16),

    #[error("service #{index} header needs {need} bytes, section_length is {section_length}")]
    ServiceHeaderOverflow {
        index: usize,
        need: usize,
        section_length: usize,
    },

    #[error("service #{index} loop needs {need} bytes, section_length is {section_length}")]
    ServiceLoopOverflow {
        index: usize,
        need: usize,
        section_length: usize,
    },

    #[error("service_loop_length {length} is shorter than the {min} byte address record")]
    AddressRecordTooShort { length: usize, min: usize },

    #[error("read of {len} bytes at offset {offset} runs past {limit}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        limit: usize,
    },

    #[error("byte read at non byte-aligned bit position {0}")]
    Misaligned(u64),

    #[error("bit field read past the end of the section")]
    Truncated,

    #[error("CRC-32 mismatch: computed 0x{computed:08X}, section carries 0x{carried:08X}")]
    CrcMismatch { computed: u32, carried: u32 },
}

impl SectionError {
    /// Well-formed input for which no parser exists.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            SectionError::UnknownTableId(_) | SectionError::UnknownExtension(_)
        )
    }
}

/// Errors returned by the resynchronizer, the framer and the read loop.
#[derive(Error, Debug)]
pub enum TlvError {
    #[error("end of stream")]
    EndOfStream,

    #[error("no TLV sync byte found in {scanned} bytes")]
    SyncNotFound { scanned: u64 },

    #[error("truncated TLV header: got {got} of 4 bytes")]
    TruncatedHeader { got: usize },

    #[error("TLV sync byte is wrong: 0x{0:02X}")]
    BadSync(u8),

    #[error("unknown TLV packet type 0x{0:02X}")]
    UnknownPacketType(u8),

    #[error("skip of {expected} bytes only advanced {actual}")]
    ShortSkip { expected: u64, actual: u64 },

    #[error("truncated TLV payload: expected {expected} bytes, got {actual}")]
    TruncatedPayload { expected: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Section(#[from] SectionError),
}

/// Scope an error applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// End of data, short reads, failed skips, exhausted resync. Ends the read loop.
    Stream,
    /// Bad sync or packet type. The caller resyncs before retrying.
    Framing,
    /// A length or record failed validation. Only that packet is lost.
    Structural,
    /// Recognized but unimplemented table. Skipped, not an error.
    Unsupported,
}

impl TlvError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TlvError::EndOfStream
            | TlvError::TruncatedHeader { .. }
            | TlvError::ShortSkip { .. }
            | TlvError::TruncatedPayload { .. }
            | TlvError::SyncNotFound { .. }
            | TlvError::Io(_) => ErrorKind::Stream,
            TlvError::BadSync(_)
            | TlvError::UnknownPacketType(_) => ErrorKind::Framing,
            TlvError::Section(e) if e.is_unsupported() => ErrorKind::Unsupported,
            TlvError::Section(_) => ErrorKind::Structural,
        }
    }
}
