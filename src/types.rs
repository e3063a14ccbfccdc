// src/types.rs
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;

use bytes::Bytes;
use serde::{Deserialize, Serialize, Serializer};

use crate::constants::*;

/// TLV packet type (byte 1 of the TLV header). The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TlvPacketType {
    Ipv4,
    Ipv6,
    HeaderCompressed,
    Signalling,
    Null,
}

impl TlvPacketType {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            TLV_TYPE_IPV4 => Some(Self::Ipv4),
            TLV_TYPE_IPV6 => Some(Self::Ipv6),
            TLV_TYPE_HEADER_COMPRESSED => Some(Self::HeaderCompressed),
            TLV_TYPE_SIGNALLING => Some(Self::Signalling),
            TLV_TYPE_NULL => Some(Self::Null),
            _ => None,
        }
    }
}

/// The fixed 4-byte TLV header, sync byte already validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvHeader {
    pub packet_type: TlvPacketType,
    pub declared_length: u16,
}

/// Outcome of framing one TLV packet.
#[derive(Debug, Clone)]
pub struct TlvPacket {
    pub packet_type: TlvPacketType,
    pub declared_length: u16,
    pub content: PacketContent,
}

#[derive(Debug, Clone)]
pub enum PacketContent {
    /// Declared length was zero.
    Empty,
    /// Payload skipped without being read into memory.
    Skipped,
    Section(SignallingSection),
    Hcfb(HcfbHeader),
}

/// Signalling table id, with the raw value kept for anything unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TableId {
    NitActual,
    NitOther,
    Extended,
    Unknown(u8),
}

impl From<u8> for TableId {
    fn from(raw: u8) -> Self {
        match raw {
            TABLE_ID_NIT_ACTUAL => TableId::NitActual,
            TABLE_ID_NIT_OTHER => TableId::NitOther,
            TABLE_ID_EXTENDED => TableId::Extended,
            other => TableId::Unknown(other),
        }
    }
}

impl From<TableId> for u8 {
    fn from(id: TableId) -> Self {
        match id {
            TableId::NitActual => TABLE_ID_NIT_ACTUAL,
            TableId::NitOther => TABLE_ID_NIT_OTHER,
            TableId::Extended => TABLE_ID_EXTENDED,
            TableId::Unknown(raw) => raw,
        }
    }
}

/// table_id_extension of an extended table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtensionId {
    Amt,
    Unknown(u16),
}

impl From<u16> for ExtensionId {
    fn from(raw: u16) -> Self {
        match raw {
            EXTENSION_ID_AMT => ExtensionId::Amt,
            other => ExtensionId::Unknown(other),
        }
    }
}

/// Common header fields of a signalling section plus its decoded body.
#[derive(Debug, Clone, Serialize)]
pub struct SignallingSection {
    pub table_id: TableId,
    pub section_syntax_indicator: bool,
    pub section_length: u16,
    pub table_id_extension: u16,
    pub version_number: u8,
    pub current_next_indicator: bool,
    pub section_number: u8,
    pub last_section_number: u8,
    pub body: SectionBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "table", rename_all = "lowercase")]
pub enum SectionBody {
    Nit(NitBody),
    Amt { services: Vec<AmtMapping> },
}

/// Network Information Table body.
#[derive(Debug, Clone, Serialize)]
pub struct NitBody {
    pub network_id: u16,
    #[serde(rename = "network_descriptors_length", serialize_with = "serialize_len")]
    pub network_descriptors: Bytes,
    pub streams: Vec<NitStream>,
}

/// One entry of the NIT TLV stream loop.
#[derive(Debug, Clone, Serialize)]
pub struct NitStream {
    pub tlv_stream_id: u16,
    pub original_network_id: u16,
    #[serde(rename = "descriptors_length", serialize_with = "serialize_len")]
    pub descriptors: Bytes,
}

fn serialize_len<S: Serializer>(b: &Bytes, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(b.len() as u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Bytes of address record a service_loop must hold for this version.
    pub fn record_size(self) -> usize {
        match self {
            IpVersion::V4 => AMT_IPV4_RECORD_SIZE,
            IpVersion::V6 => AMT_IPV6_RECORD_SIZE,
        }
    }
}

/// Raw source or destination address of an AMT record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmtAddress {
    V4([u8; 4]),
    V6([u8; 16]),
}

impl From<AmtAddress> for IpAddr {
    fn from(a: AmtAddress) -> Self {
        match a {
            AmtAddress::V4(b) => IpAddr::V4(Ipv4Addr::from(b)),
            AmtAddress::V6(b) => IpAddr::V6(Ipv6Addr::from(b)),
        }
    }
}

/// One service_id → IP address range mapping of the Address Mapping Table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmtMapping {
    pub service_id: u16,
    pub ip_version: IpVersion,
    pub src_address: AmtAddress,
    pub src_mask: u8,
    pub dst_address: AmtAddress,
    pub dst_mask: u8,
}

impl AmtMapping {
    pub fn source(&self) -> IpAddr {
        self.src_address.into()
    }

    pub fn destination(&self) -> IpAddr {
        self.dst_address.into()
    }
}

impl fmt::Display for AmtMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "service 0x{:04X}: {}/{} -> {}/{}",
            self.service_id,
            self.source(),
            self.src_mask,
            self.destination(),
            self.dst_mask
        )
    }
}

#[derive(Serialize)]
struct AmtMappingJson {
    service_id: u16,
    ip_version: IpVersion,
    source: String,
    destination: String,
}

impl Serialize for AmtMapping {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        AmtMappingJson {
            service_id: self.service_id,
            ip_version: self.ip_version,
            source: format!("{}/{}", self.source(), self.src_mask),
            destination: format!("{}/{}", self.destination(), self.dst_mask),
        }
        .serialize(s)
    }
}

/// Compressed header context of a Header-Compression-for-Broadcast packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HcfbHeader {
    pub context_id: u16,
    pub sequence_number: u8,
    pub context_header_type: u8,
}

impl HcfbHeader {
    pub fn header_type(&self) -> HcfbHeaderType {
        HcfbHeaderType::from(self.context_header_type)
    }
}

/// Context header types of ARIB STD-B60 header compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HcfbHeaderType {
    PartialIpv4,
    Ipv4NoTotalLength,
    PartialIpv6,
    Ipv6NoPayloadLength,
    Unknown(u8),
}

impl From<u8> for HcfbHeaderType {
    fn from(raw: u8) -> Self {
        match raw {
            0x20 => HcfbHeaderType::PartialIpv4,
            0x21 => HcfbHeaderType::Ipv4NoTotalLength,
            0x60 => HcfbHeaderType::PartialIpv6,
            0x61 => HcfbHeaderType::Ipv6NoPayloadLength,
            other => HcfbHeaderType::Unknown(other),
        }
    }
}

/// Read loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemuxOptions {
    /// Bytes resync may scan before giving up
    pub resync_limit: u32,
    /// Check the trailing CRC-32 of every signalling section
    pub verify_crc: bool,
    /// Framing failures in a row before the read loop gives up
    pub max_consecutive_failures: u32,
}

impl Default for DemuxOptions {
    fn default() -> Self {
        Self {
            resync_limit: DEFAULT_RESYNC_LIMIT,
            verify_crc: false,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
        }
    }
}

/// Configuration options for the demuxer
pub struct Options {
    pub input: PathBuf,
    pub demux: DemuxOptions,
    /// Include every decoded table in the report
    pub list_tables: bool,
}
