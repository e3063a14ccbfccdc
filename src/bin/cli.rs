// src/bin/cli.rs
use std::path::PathBuf;

use clap::Parser;
use mmtp_tlv::constants::{DEFAULT_MAX_CONSECUTIVE_FAILURES, DEFAULT_RESYNC_LIMIT};
use mmtp_tlv::demuxer::{run, DemuxOptions, Options, Reporter};

#[derive(Parser)]
#[command(name = "mmtp-tlv", about = "Decode TLV framing and signalling tables of an MMTP/TLV capture")]
struct Opt {
    /// MMTP/TLV capture (.mmts / .tlvmmt); must be seekable
    input: PathBuf,

    /// Bytes to scan for a sync byte before giving up
    #[clap(long, default_value_t = DEFAULT_RESYNC_LIMIT)]
    resync_limit: u32,

    /// Reject signalling sections whose CRC-32 does not match
    #[clap(long, default_value_t = false)]
    verify_crc: bool,

    /// Framing errors in a row before giving up
    #[clap(long, default_value_t = DEFAULT_MAX_CONSECUTIVE_FAILURES)]
    max_failures: u32,

    /// Include every decoded section in the report, not just the latest NIT/AMT
    #[clap(long, default_value_t = false)]
    tables: bool,

    /// -v debug, -vv trace
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();

    let level = match opt.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if opt.input.as_os_str() == "-" {
        anyhow::bail!("stdin is not supported: resync needs a seekable input");
    }

    let report = run(Options {
        input: opt.input,
        demux: DemuxOptions {
            resync_limit: opt.resync_limit,
            verify_crc: opt.verify_crc,
            max_consecutive_failures: opt.max_failures,
        },
        list_tables: opt.tables,
    })
    .await?;

    println!("{}", Reporter::to_json(&report)?);
    Ok(())
}
