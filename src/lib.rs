// src/lib.rs
pub mod demuxer {
    pub use crate::report::{DemuxReport, Reporter};
    pub use crate::types::{DemuxOptions, Options};

    /// Async entry-point; returns at end of input, on a fatal error or on Ctrl-C
    pub async fn run(opts: Options) -> anyhow::Result<DemuxReport> {
        crate::core::run(opts).await
    }
}

pub mod constants;
pub mod demux;
pub mod error;
pub mod hcfb;
pub mod probe;
pub mod report;
pub mod resync;
pub mod si;
pub mod source;
pub mod stats;
pub mod types;
mod core;         // file runner behind demuxer::run

pub use demux::{PacketObserver, TlvDemuxer};
pub use error::{ErrorKind, SectionError, TlvError};
pub use source::{ByteSource, IoSource};
