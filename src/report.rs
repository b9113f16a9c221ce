// ============================================================
//  report.rs - Construirea și serializarea raportului CSV
// ============================================================
//
//  Schema fixă (compatibilă cu rapoartele existente):
//
//    IP,Total_Eventos,Detectado_PortScan
//    10.0.0.15,15,Sim
//    192.168.1.100,5,Não
//
//  Ordinea rândurilor: total evenimente descrescător, apoi IP crescător.
// ============================================================

use crate::aggregator::PerIpState;
use crate::detector::ScanVerdict;
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const REPORT_HEADER: [&str; 3] = ["IP", "Total_Eventos", "Detectado_PortScan"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "IP")]
    pub source_ip: String,

    #[serde(rename = "Total_Eventos")]
    pub total_events: usize,

    #[serde(rename = "Detectado_PortScan", with = "scan_token")]
    pub is_scan: bool,
}

// ---------------------------------------------------------------------------
// Coloana de scan se scrie "Sim" / "Não". La citire acceptăm și
// "true"/"false" și "Nao" (fără diacritice), indiferent de majuscule.
// ---------------------------------------------------------------------------
mod scan_token {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const YES: &str = "Sim";
    pub const NO: &str = "Não";

    pub fn serialize<S: Serializer>(is_scan: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *is_scan { YES } else { NO })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_lowercase().as_str() {
            "sim" | "true" => Ok(true),
            "não" | "nao" | "false" => Ok(false),
            other => Err(D::Error::custom(format!(
                "valoare Detectado_PortScan necunoscută: '{}'",
                other
            ))),
        }
    }
}

/// Totalurile din raport, pentru afișarea rezumatului.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub total_ips: usize,
    pub scans:     usize,
    pub normal:    usize,
}

/// Îmbină totalurile agregate cu verdictele. Fiecare IP produce un rând.
pub fn build(
    per_ip: &HashMap<String, PerIpState>,
    verdicts: &BTreeMap<String, ScanVerdict>,
) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = per_ip
        .iter()
        .map(|(ip, state)| ReportRow {
            source_ip:    ip.clone(),
            total_events: state.total_events,
            is_scan:      verdicts.get(ip).is_some_and(|v| v.is_scan),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_events
            .cmp(&a.total_events)
            .then_with(|| a.source_ip.cmp(&b.source_ip))
    });
    rows
}

pub fn summarize(rows: &[ReportRow]) -> ReportSummary {
    let scans = rows.iter().filter(|r| r.is_scan).count();
    ReportSummary {
        total_ips: rows.len(),
        scans,
        normal: rows.len() - scans,
    }
}

// Header-ul se scrie mereu explicit, ca un raport fără rânduri
// să aibă totuși schema completă.
pub fn write_rows<W: Write>(writer: W, rows: &[ReportRow]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(REPORT_HEADER)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<(), AnalysisError> {
    let sink_error = |source: csv::Error| AnalysisError::SinkWriteFailure {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(|e| sink_error(e.into()))?;
    write_rows(file, rows).map_err(sink_error)
}

pub fn read_report(path: &Path) -> Result<Vec<ReportRow>, AnalysisError> {
    let unreadable = |source: csv::Error| AnalysisError::ReportUnreadable {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(unreadable)?;
    reader
        .deserialize()
        .collect::<Result<Vec<ReportRow>, csv::Error>>()
        .map_err(unreadable)
}
