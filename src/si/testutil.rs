// src/si/testutil.rs
//! Builders for synthetic sections used by the unit tests.

use crc::{Crc, CRC_32_MPEG_2};

const CRC_MPEG: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// Full section with syntax indicator set, version 0, current, section 0/0 and a valid CRC.
pub fn section(table_id: u8, table_id_extension: u16, body: &[u8]) -> Vec<u8> {
    let section_length = 5 + body.len() + 4;
    let mut v = vec![
        table_id,
        0xB0 | ((section_length >> 8) as u8 & 0x0F),
        section_length as u8,
    ];
    v.extend_from_slice(&table_id_extension.to_be_bytes());
    v.extend_from_slice(&[0xC1, 0x00, 0x00]);
    v.extend_from_slice(body);
    let crc = CRC_MPEG.checksum(&v);
    v.extend_from_slice(&crc.to_be_bytes());
    v
}

fn length_field(len: usize) -> [u8; 2] {
    [0xF0 | ((len >> 8) as u8 & 0x0F), len as u8]
}

/// One TLV stream loop entry declaring `declared` descriptor bytes.
pub fn nit_entry(tlv_stream_id: u16, original_network_id: u16, declared: usize, descriptors: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&tlv_stream_id.to_be_bytes());
    v.extend_from_slice(&original_network_id.to_be_bytes());
    v.extend_from_slice(&length_field(declared));
    v.extend_from_slice(descriptors);
    v
}

/// NIT body with every length field given explicitly.
pub fn nit_body_raw(
    network_descriptors_length: usize,
    network_descriptors: &[u8],
    tlv_stream_loop_length: usize,
    entries: &[u8],
) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&length_field(network_descriptors_length));
    v.extend_from_slice(network_descriptors);
    v.extend_from_slice(&length_field(tlv_stream_loop_length));
    v.extend_from_slice(entries);
    v
}

/// Well-formed NIT body.
pub fn nit_body(network_descriptors: &[u8], streams: &[(u16, u16, Vec<u8>)]) -> Vec<u8> {
    let mut entries = Vec::new();
    for (id, onid, d) in streams {
        entries.extend(nit_entry(*id, *onid, d.len(), d));
    }
    nit_body_raw(network_descriptors.len(), network_descriptors, entries.len(), &entries)
}

/// 192.0.2.1/24 -> 198.51.100.1/16
pub fn v4_record() -> Vec<u8> {
    vec![192, 0, 2, 1, 24, 198, 51, 100, 1, 16]
}

pub fn amt_service(service_id: u16, ipv6: bool, service_loop_length: usize, record: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&service_id.to_be_bytes());
    v.push(((ipv6 as u8) << 7) | 0x7C | ((service_loop_length >> 8) as u8 & 0x03));
    v.push(service_loop_length as u8);
    v.extend_from_slice(record);
    v
}

pub fn amt_body_raw(num_of_service_id: usize, services: &[u8]) -> Vec<u8> {
    let mut v = vec![
        (num_of_service_id >> 2) as u8,
        ((num_of_service_id as u8 & 0x03) << 6) | 0x3F,
    ];
    v.extend_from_slice(services);
    v
}

/// Well-formed AMT body; each record's length becomes its service_loop_length.
pub fn amt_body(services: &[(u16, bool, Vec<u8>)]) -> Vec<u8> {
    let mut loops = Vec::new();
    for (id, ipv6, record) in services {
        loops.extend(amt_service(*id, *ipv6, record.len(), record));
    }
    amt_body_raw(services.len(), &loops)
}

/// `[0x7F, type, len_hi, len_lo] ++ payload`
pub fn tlv_packet(packet_type: u8, payload: &[u8]) -> Vec<u8> {
    let mut v = vec![0x7F, packet_type];
    v.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    v.extend_from_slice(payload);
    v
}
