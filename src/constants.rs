// src/constants.rs
//! Wire constants for TLV framing (ITU-R BT.1869) and the signalling tables it carries

/// TLV packet constants
pub const TLV_SYNC_BYTE: u8 = 0x7F;
pub const TLV_HEADER_SIZE: usize = 4;

/// TLV packet types
pub const TLV_TYPE_IPV4: u8 = 0x01;
pub const TLV_TYPE_IPV6: u8 = 0x02;
pub const TLV_TYPE_HEADER_COMPRESSED: u8 = 0x03;
pub const TLV_TYPE_SIGNALLING: u8 = 0xFE;
pub const TLV_TYPE_NULL: u8 = 0xFF;

/// Resync gives up after this many single-byte reads
pub const DEFAULT_RESYNC_LIMIT: u32 = 10 * 1024 * 1024;
/// Framing failures in a row before the read loop gives up
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 16;

/// Signalling table ids
pub const TABLE_ID_NIT_ACTUAL: u8 = 0x40;
pub const TABLE_ID_NIT_OTHER: u8 = 0x41;
pub const TABLE_ID_EXTENDED: u8 = 0xFE;

/// table_id_extension values under TABLE_ID_EXTENDED
pub const EXTENSION_ID_AMT: u16 = 0x0000;

/// Section sizes
pub const SECTION_HEADER_SIZE: usize = 3; // table_id + flags/section_length
pub const SECTION_MIN_PAYLOAD: usize = 12; // 8 common header + 4 CRC
pub const SECTION_CRC_SIZE: usize = 4;
pub const NIT_MAX_SECTION_LENGTH: usize = 1021;
pub const NIT_MIN_SECTION_LENGTH: usize = 13; // 5 common tail + 2 x 2 length fields + CRC
pub const NIT_STREAM_ENTRY_SIZE: usize = 6;
pub const AMT_MIN_SECTION_LENGTH: usize = 11; // 5 common tail + 2 count + CRC
pub const AMT_SERVICE_HEADER_SIZE: usize = 4;
pub const AMT_IPV4_RECORD_SIZE: usize = 10; // 4 + 1 + 4 + 1
pub const AMT_IPV6_RECORD_SIZE: usize = 34; // 16 + 1 + 16 + 1

/// HCfB header
pub const HCFB_HEADER_SIZE: usize = 3;
