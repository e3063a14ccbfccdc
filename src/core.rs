// src/core.rs
use std::{
    fs::File,
    io::{BufRead, BufReader},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::Context;
use log::{info, warn};

use crate::demux::TlvDemuxer;
use crate::probe::{probe, probe_extension};
use crate::report::{DemuxReport, Reporter, TableLog};
use crate::source::IoSource;
use crate::types::Options;

/// Runs the blocking read loop off the runtime; Ctrl-C stops it between packets.
pub async fn run(opts: Options) -> anyhow::Result<DemuxReport> {
    let stop = Arc::new(AtomicBool::new(false));

    let flag = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, finishing current packet");
            flag.store(true, Ordering::Relaxed);
        }
    });

    tokio::task::spawn_blocking(move || demux_file(&opts, &stop))
        .await
        .context("demux thread panicked")?
}

fn demux_file(opts: &Options, stop: &AtomicBool) -> anyhow::Result<DemuxReport> {
    let input = opts.input.display().to_string();
    let file = File::open(&opts.input).with_context(|| format!("opening {input}"))?;
    let mut reader = BufReader::new(file);

    let head = reader.fill_buf().with_context(|| format!("reading {input}"))?;
    let score = probe(head).max(probe_extension(&opts.input));
    if score == 0 {
        warn!("{input} does not look like MMTP/TLV, trying anyway");
    }

    let src = IoSource::new(reader)?;
    let mut demux = TlvDemuxer::new(src, opts.demux.clone());
    let mut tables = TableLog::new(opts.list_tables);

    let stopped_by = match demux.run(&mut tables, stop) {
        Ok(()) => None,
        Err(e) => {
            warn!("read loop ended at offset {}: {e}", demux.position());
            Some(e.to_string())
        }
    };

    let stats = demux.stats();
    info!(
        "{} packets, {} sections ({} NIT, {} AMT), {} HCfB, {} dropped, {} resyncs",
        stats.packets,
        stats.sections_ok,
        stats.nit_sections,
        stats.amt_sections,
        stats.hcfb_packets,
        stats.structural_errors,
        stats.resyncs
    );

    Ok(Reporter::create_report(&input, stats, &tables, stopped_by))
}
