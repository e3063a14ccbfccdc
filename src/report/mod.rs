// src/report/mod.rs
//! Report generation for demux results

use serde::Serialize;

use crate::demux::PacketObserver;
use crate::stats::DemuxStats;
use crate::types::{HcfbHeader, SectionBody, SignallingSection, TableId};

/// Decoded signalling, as seen by the read loop
#[derive(Default)]
pub struct TableLog {
    keep_all: bool,
    pub latest_nit: Option<SignallingSection>,
    pub latest_amt: Option<SignallingSection>,
    pub sections: Vec<SignallingSection>,
    pub last_hcfb: Option<HcfbHeader>,
}

impl TableLog {
    /// `keep_all` retains every decoded section, not just the latest of each table
    pub fn new(keep_all: bool) -> Self {
        Self {
            keep_all,
            ..Self::default()
        }
    }
}

impl PacketObserver for TableLog {
    fn on_section(&mut self, section: &SignallingSection) {
        match section.body {
            SectionBody::Nit(_) if section.table_id == TableId::NitActual => {
                self.latest_nit = Some(section.clone())
            }
            SectionBody::Nit(_) => {}
            SectionBody::Amt { .. } => self.latest_amt = Some(section.clone()),
        }
        if self.keep_all {
            self.sections.push(section.clone());
        }
    }

    fn on_hcfb(&mut self, header: &HcfbHeader) {
        self.last_hcfb = Some(*header);
    }
}

/// Complete demux report
#[derive(Debug, Clone, Serialize)]
pub struct DemuxReport {
    pub timestamp: String,
    pub input: String,
    pub stats: DemuxStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nit: Option<SignallingSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amt: Option<SignallingSection>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<SignallingSection>,
    /// Most recent HCfB context header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hcfb: Option<HcfbHeader>,
    /// Why the read loop ended, when it was not end of stream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_by: Option<String>,
}

/// Report generator
pub struct Reporter;

impl Reporter {
    pub fn create_report(
        input: &str,
        stats: &DemuxStats,
        tables: &TableLog,
        stopped_by: Option<String>,
    ) -> DemuxReport {
        DemuxReport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            input: input.to_string(),
            stats: stats.clone(),
            nit: tables.latest_nit.clone(),
            amt: tables.latest_amt.clone(),
            sections: tables.sections.clone(),
            hcfb: tables.last_hcfb,
            stopped_by,
        }
    }

    pub fn to_json(report: &DemuxReport) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}
