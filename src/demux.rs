// src/demux.rs
//! TLV framing and the packet read loop

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use log::{debug, trace, warn};

use crate::constants::{TLV_HEADER_SIZE, TLV_SYNC_BYTE};
use crate::error::{ErrorKind, SectionError, TlvError};
use crate::hcfb::parse_hcfb;
use crate::resync::resync;
use crate::si::parse_section;
use crate::source::ByteSource;
use crate::stats::DemuxStats;
use crate::types::{
    DemuxOptions, HcfbHeader, PacketContent, SectionBody, SignallingSection, TlvHeader, TlvPacket,
    TlvPacketType,
};

/// Receives everything the demuxer decodes. All methods default to no-ops.
pub trait PacketObserver {
    fn on_section(&mut self, _section: &SignallingSection) {}
    fn on_hcfb(&mut self, _header: &HcfbHeader) {}
    fn on_skipped(&mut self, _packet_type: TlvPacketType, _length: u16) {}
    /// A signalling section whose table id or extension has no parser.
    fn on_unsupported(&mut self, _reason: &SectionError) {}
    fn on_error(&mut self, _error: &TlvError) {}
}

impl PacketObserver for () {}

/// Reads TLV packets from a [`ByteSource`] one at a time.
pub struct TlvDemuxer<S> {
    src: S,
    opts: DemuxOptions,
    stats: DemuxStats,
}

impl<S: ByteSource> TlvDemuxer<S> {
    pub fn new(src: S, opts: DemuxOptions) -> Self {
        Self {
            src,
            opts,
            stats: DemuxStats::new(),
        }
    }

    pub fn stats(&self) -> &DemuxStats {
        &self.stats
    }

    pub fn position(&self) -> u64 {
        self.src.tell()
    }

    /// Positions the source on the next sync byte.
    pub fn resync(&mut self) -> Result<(), TlvError> {
        let start = self.src.tell();
        let discarded = resync(&mut self.src, self.opts.resync_limit)?;
        if discarded > 0 {
            warn!("TLV resync skipped {discarded} bytes at offset {start}");
        }
        self.stats.record_resync(discarded);
        Ok(())
    }

    /// Frames exactly one TLV packet and decodes it if a parser exists for its type.
    ///
    /// On a structural error the packet has still been consumed in full, so
    /// the next call starts on the following packet.
    pub fn read_one(&mut self, obs: &mut dyn PacketObserver) -> Result<TlvPacket, TlvError> {
        let result = self.frame(obs);
        match &result {
            Err(TlvError::Section(e)) if e.is_unsupported() => {
                self.stats.unsupported_sections += 1;
                obs.on_unsupported(e);
            }
            Err(e) => {
                match e.kind() {
                    ErrorKind::Framing => self.stats.framing_errors += 1,
                    ErrorKind::Structural => self.stats.structural_errors += 1,
                    ErrorKind::Unsupported | ErrorKind::Stream => {}
                }
                obs.on_error(e);
            }
            Ok(_) => {}
        }
        result
    }

    /// One read loop iteration: resync, then frame.
    pub fn read_packet(&mut self, obs: &mut dyn PacketObserver) -> Result<TlvPacket, TlvError> {
        if let Err(e) = self.resync() {
            if !matches!(e, TlvError::EndOfStream) {
                obs.on_error(&e);
            }
            return Err(e);
        }
        self.read_one(obs)
    }

    /// Reads packets until end of stream, a fatal error, or `stop` is set.
    ///
    /// Structural and unsupported-table errors drop only the packet they came
    /// from. Framing errors are retried after a resync, up to
    /// `max_consecutive_failures` in a row.
    pub fn run(&mut self, obs: &mut dyn PacketObserver, stop: &AtomicBool) -> Result<(), TlvError> {
        let mut failures = 0u32;
        while !stop.load(Ordering::Relaxed) {
            let offset = self.src.tell();
            let e = match self.read_packet(obs) {
                Ok(_) => {
                    failures = 0;
                    continue;
                }
                Err(e) => e,
            };
            match e.kind() {
                ErrorKind::Structural => {
                    failures = 0;
                    warn!("dropping TLV packet at offset {offset}: {e}");
                }
                ErrorKind::Unsupported => {
                    failures = 0;
                    debug!("skipping TLV packet at offset {offset}: {e}");
                }
                ErrorKind::Framing => {
                    failures += 1;
                    warn!("framing error at offset {offset}: {e}");
                    if failures >= self.opts.max_consecutive_failures {
                        return Err(e);
                    }
                }
                ErrorKind::Stream => {
                    return match e {
                        TlvError::EndOfStream => Ok(()),
                        e => Err(e),
                    };
                }
            }
        }
        debug!("read loop stopped at offset {}", self.src.tell());
        Ok(())
    }

    fn frame(&mut self, obs: &mut dyn PacketObserver) -> Result<TlvPacket, TlvError> {
        let TlvHeader {
            packet_type,
            declared_length,
        } = self.read_header()?;
        trace!("TLV packet of type {packet_type:?} and size {declared_length} found");

        let packet = |content| TlvPacket {
            packet_type,
            declared_length,
            content,
        };

        if declared_length == 0 {
            self.stats.record_packet(packet_type, 0);
            return Ok(packet(PacketContent::Empty));
        }

        match packet_type {
            TlvPacketType::Signalling => {
                let verify_crc = self.opts.verify_crc;
                let payload = self.read_payload(packet_type, declared_length)?;
                let section = self.decode(|p| parse_section(p, verify_crc), &payload)?;
                self.stats.sections_ok += 1;
                match section.body {
                    SectionBody::Nit(_) => self.stats.nit_sections += 1,
                    SectionBody::Amt { .. } => self.stats.amt_sections += 1,
                }
                obs.on_section(&section);
                Ok(packet(PacketContent::Section(section)))
            }
            TlvPacketType::HeaderCompressed => {
                let payload = self.read_payload(packet_type, declared_length)?;
                let header = self.decode(|p| parse_hcfb(p), &payload)?;
                self.stats.hcfb_packets += 1;
                debug!(
                    "HCfB context {} seq {} header type {:?}",
                    header.context_id,
                    header.sequence_number,
                    header.header_type()
                );
                obs.on_hcfb(&header);
                Ok(packet(PacketContent::Hcfb(header)))
            }
            TlvPacketType::Ipv4 | TlvPacketType::Ipv6 | TlvPacketType::Null => {
                self.skip_payload(packet_type, declared_length)?;
                obs.on_skipped(packet_type, declared_length);
                Ok(packet(PacketContent::Skipped))
            }
        }
    }

    fn read_header(&mut self) -> Result<TlvHeader, TlvError> {
        let mut hdr = [0u8; TLV_HEADER_SIZE];
        let got = self.src.read(&mut hdr)?;
        if got == 0 {
            return Err(TlvError::EndOfStream);
        }
        if got < TLV_HEADER_SIZE {
            return Err(TlvError::TruncatedHeader { got });
        }
        if hdr[0] != TLV_SYNC_BYTE {
            return Err(TlvError::BadSync(hdr[0]));
        }
        let packet_type =
            TlvPacketType::from_u8(hdr[1]).ok_or(TlvError::UnknownPacketType(hdr[1]))?;
        Ok(TlvHeader {
            packet_type,
            declared_length: u16::from_be_bytes([hdr[2], hdr[3]]),
        })
    }

    fn read_payload(&mut self, packet_type: TlvPacketType, len: u16) -> Result<Bytes, TlvError> {
        let expected = usize::from(len);
        let mut buf = vec![0u8; expected];
        self.stats.payload_allocations += 1;
        let actual = self.src.read(&mut buf)?;
        if actual < expected {
            return Err(TlvError::TruncatedPayload { expected, actual });
        }
        self.stats.record_packet(packet_type, len);
        Ok(Bytes::from(buf))
    }

    fn skip_payload(&mut self, packet_type: TlvPacketType, len: u16) -> Result<(), TlvError> {
        let expected = u64::from(len);
        let start = self.src.tell();
        let actual = self.src.skip(expected)? - start;
        if actual != expected {
            return Err(TlvError::ShortSkip { expected, actual });
        }
        debug!("skipped {packet_type:?} payload of {len} bytes");
        self.stats.bytes_skipped += expected;
        self.stats.record_packet(packet_type, len);
        Ok(())
    }

    fn decode<T>(
        &mut self,
        parser: impl FnOnce(&Bytes) -> Result<T, SectionError>,
        payload: &Bytes,
    ) -> Result<T, TlvError> {
        self.stats.subparser_calls += 1;
        Ok(parser(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::si::testutil::{amt_body, nit_body, section, tlv_packet, v4_record};
    use crate::source::IoSource;
    use proptest::prelude::*;
    use std::io::Cursor;

    type Demux = TlvDemuxer<IoSource<Cursor<Vec<u8>>>>;

    fn demuxer(data: Vec<u8>) -> Demux {
        TlvDemuxer::new(IoSource::new(Cursor::new(data)).unwrap(), DemuxOptions::default())
    }

    #[derive(Default)]
    struct Counter {
        sections: usize,
        hcfb: usize,
        skipped: usize,
        unsupported: usize,
        errors: usize,
    }

    impl PacketObserver for Counter {
        fn on_section(&mut self, _: &SignallingSection) {
            self.sections += 1;
        }
        fn on_hcfb(&mut self, _: &HcfbHeader) {
            self.hcfb += 1;
        }
        fn on_skipped(&mut self, _: TlvPacketType, _: u16) {
            self.skipped += 1;
        }
        fn on_unsupported(&mut self, _: &SectionError) {
            self.unsupported += 1;
        }
        fn on_error(&mut self, _: &TlvError) {
            self.errors += 1;
        }
    }

    #[test]
    fn skipped_types_never_reach_a_parser() {
        let mut data = tlv_packet(0x01, &[0x45; 20]);
        data.extend(tlv_packet(0x02, &[0x60; 40]));
        data.extend(tlv_packet(0xFF, &[0xFF; 8]));
        let mut d = demuxer(data);
        let mut obs = Counter::default();
        for _ in 0..3 {
            let p = d.read_one(&mut obs).unwrap();
            assert!(matches!(p.content, PacketContent::Skipped));
        }
        assert_eq!(d.stats().payload_allocations, 0);
        assert_eq!(d.stats().subparser_calls, 0);
        assert_eq!(d.stats().bytes_skipped, 68);
        assert_eq!(obs.skipped, 3);
        assert_eq!(obs.sections + obs.hcfb, 0);
    }

    #[test]
    fn zero_length_packet_is_empty() {
        let mut d = demuxer(tlv_packet(0xFE, &[]));
        let p = d.read_one(&mut ()).unwrap();
        assert!(matches!(p.content, PacketContent::Empty));
        assert_eq!(d.position(), 4);
        assert_eq!(d.stats().subparser_calls, 0);
    }

    #[test]
    fn decodes_signalling_and_hcfb() {
        let nit = section(0x40, 1, &nit_body(&[], &[(1, 1, vec![])]));
        let amt = section(0xFE, 0, &amt_body(&[(5, false, v4_record())]));
        let mut data = tlv_packet(0xFE, &nit);
        data.extend(tlv_packet(0xFE, &amt));
        data.extend(tlv_packet(0x03, &[0x12, 0x34, 0x56, 0x45, 0x00]));
        let mut d = demuxer(data);
        let mut obs = Counter::default();

        assert!(matches!(d.read_one(&mut obs).unwrap().content, PacketContent::Section(_)));
        assert!(matches!(d.read_one(&mut obs).unwrap().content, PacketContent::Section(_)));
        match d.read_one(&mut obs).unwrap().content {
            PacketContent::Hcfb(h) => assert_eq!(h.context_id, 0x123),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(obs.sections, 2);
        assert_eq!(obs.hcfb, 1);
        assert_eq!(d.stats().nit_sections, 1);
        assert_eq!(d.stats().amt_sections, 1);
        assert_eq!(d.stats().payload_allocations, 3);
        assert!(matches!(d.read_one(&mut obs), Err(TlvError::EndOfStream)));
    }

    #[test]
    fn bad_sync_is_reported() {
        let mut d = demuxer(vec![0x47, 0x01, 0x00, 0x00]);
        assert!(matches!(d.read_one(&mut ()), Err(TlvError::BadSync(0x47))));
        assert_eq!(d.stats().framing_errors, 1);
    }

    #[test]
    fn unknown_packet_type_is_reported() {
        let mut d = demuxer(vec![0x7F, 0x04, 0x00, 0x00]);
        assert!(matches!(d.read_one(&mut ()), Err(TlvError::UnknownPacketType(0x04))));
    }

    #[test]
    fn partial_header_is_truncated() {
        let mut d = demuxer(vec![0x7F, 0x01]);
        assert!(matches!(
            d.read_one(&mut ()),
            Err(TlvError::TruncatedHeader { got: 2 })
        ));
    }

    #[test]
    fn short_skip_is_detected() {
        let mut data = tlv_packet(0x01, &[0u8; 10]);
        data.truncate(9);
        let mut d = demuxer(data);
        assert!(matches!(
            d.read_one(&mut ()),
            Err(TlvError::ShortSkip {
                expected: 10,
                actual: 5
            })
        ));
    }

    #[test]
    fn short_payload_is_truncated() {
        let mut data = tlv_packet(0xFE, &[0u8; 30]);
        data.truncate(20);
        let mut d = demuxer(data);
        assert!(matches!(
            d.read_one(&mut ()),
            Err(TlvError::TruncatedPayload {
                expected: 30,
                actual: 16
            })
        ));
    }

    #[test]
    fn corrupt_section_keeps_alignment() {
        let mut nit = section(0x40, 1, &nit_body(&[], &[(1, 1, vec![])]));
        nit[2] = 0xFF; // section_length past the packet
        let mut data = tlv_packet(0xFE, &nit);
        data.extend(tlv_packet(0xFF, &[0; 3]));
        let mut d = demuxer(data);
        let err = d.read_one(&mut ()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert!(matches!(
            err,
            TlvError::Section(SectionError::SectionLengthOverflow { .. })
        ));
        assert!(matches!(d.read_one(&mut ()).unwrap().content, PacketContent::Skipped));
        assert_eq!(d.stats().structural_errors, 1);
    }

    #[test]
    fn run_recovers_from_garbage_and_bad_tables() {
        let mut data = vec![0x00, 0x11, 0x22];
        data.extend(tlv_packet(0xFE, &section(0x42, 1, &[0u8; 8])));
        data.extend([0x7F, 0x09, 0x00, 0x00]); // unknown type
        data.extend(tlv_packet(0x03, &[0x00]));
        data.extend(tlv_packet(0xFE, &section(0x40, 1, &nit_body(&[], &[]))));
        let mut d = demuxer(data);
        let mut obs = Counter::default();

        d.run(&mut obs, &AtomicBool::new(false)).unwrap();
        let s = d.stats();
        assert_eq!(s.unsupported_sections, 1);
        assert_eq!(s.framing_errors, 1);
        assert_eq!(s.structural_errors, 1);
        assert_eq!(s.nit_sections, 1);
        assert_eq!(s.resyncs, 1);
        assert_eq!(s.resync_bytes_discarded, 3);
        assert_eq!(obs.sections, 1);
        // unknown table 0x42 is not reported as an error
        assert_eq!(obs.unsupported, 1);
        assert_eq!(obs.errors, 2);
    }

    #[test]
    fn run_honours_stop_flag() {
        let mut d = demuxer(tlv_packet(0xFF, &[0; 4]));
        d.run(&mut (), &AtomicBool::new(true)).unwrap();
        assert_eq!(d.stats().packets, 0);
        assert_eq!(d.position(), 0);
    }

    #[test]
    fn run_gives_up_after_repeated_framing_errors() {
        let data = [0x7F, 0x10, 0x00, 0x00].repeat(4);
        let opts = DemuxOptions {
            max_consecutive_failures: 3,
            ..DemuxOptions::default()
        };
        let mut d = TlvDemuxer::new(IoSource::new(Cursor::new(data)).unwrap(), opts);
        assert!(matches!(
            d.run(&mut (), &AtomicBool::new(false)),
            Err(TlvError::UnknownPacketType(0x10))
        ));
    }

    proptest! {
        #[test]
        fn framing_consumes_header_plus_length(
            packet_type in prop::sample::select(vec![0x01u8, 0x02, 0x03, 0xFE, 0xFF]),
            payload in prop::collection::vec(any::<u8>(), 0..512),
        ) {
            let mut data = tlv_packet(packet_type, &payload);
            data.extend([0x7F, 0xFF, 0x00, 0x00]);
            let mut d = demuxer(data);
            let _ = d.read_one(&mut ());
            prop_assert_eq!(d.position(), 4 + payload.len() as u64);
        }
    }
}
