// src/stats/mod.rs
//! Counters kept by the demuxer while it reads a stream

use serde::Serialize;

use crate::types::TlvPacketType;

/// Per packet-type counts
#[derive(Default, Debug, Clone, Serialize)]
pub struct PacketTypeCounts {
    pub ipv4: u64,
    pub ipv6: u64,
    pub header_compressed: u64,
    pub signalling: u64,
    pub null: u64,
}

#[derive(Default, Debug, Clone, Serialize)]
pub struct DemuxStats {
    pub packets: u64,
    pub packets_by_type: PacketTypeCounts,
    pub bytes_consumed: u64,
    pub bytes_skipped: u64,

    /// Payload buffers materialized (signalling + HCfB only)
    pub payload_allocations: u64,
    /// Section / HCfB parser invocations
    pub subparser_calls: u64,

    pub sections_ok: u64,
    pub nit_sections: u64,
    pub amt_sections: u64,
    pub hcfb_packets: u64,
    pub unsupported_sections: u64,

    pub structural_errors: u64,
    pub framing_errors: u64,
    pub resyncs: u64,
    pub resync_bytes_discarded: u64,
}

impl DemuxStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a framed packet of `declared_length` payload bytes
    pub fn record_packet(&mut self, packet_type: TlvPacketType, declared_length: u16) {
        self.packets += 1;
        self.bytes_consumed += 4 + u64::from(declared_length);
        let c = &mut self.packets_by_type;
        match packet_type {
            TlvPacketType::Ipv4 => c.ipv4 += 1,
            TlvPacketType::Ipv6 => c.ipv6 += 1,
            TlvPacketType::HeaderCompressed => c.header_compressed += 1,
            TlvPacketType::Signalling => c.signalling += 1,
            TlvPacketType::Null => c.null += 1,
        }
    }

    /// Count a resync that had to discard bytes
    pub fn record_resync(&mut self, discarded: u64) {
        if discarded > 0 {
            self.resyncs += 1;
            self.resync_bytes_discarded += discarded;
        }
    }
}
