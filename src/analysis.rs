// ============================================================
//  analysis.rs - Pipeline-ul complet: linii -> agregare -> verdicte -> raport
// ============================================================
//
//  Sursa de text este deschisă aici; parsarea, agregarea și detecția
//  rămân pure. O sursă care nu poate fi citită oprește analiza înainte
//  de a produce vreun raport.
// ============================================================

use crate::aggregator::{Aggregation, Aggregator};
use crate::config::DetectionConfig;
use crate::detector::{detect_all, ScanVerdict};
use crate::error::AnalysisError;
use crate::parser::LineParser;
use crate::report::{self, ReportRow, ReportSummary};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// Rezultatul în memorie al unei analize.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub aggregation: Aggregation,
    pub verdicts:    BTreeMap<String, ScanVerdict>,
    pub rows:        Vec<ReportRow>,
}

impl Analysis {
    pub fn from_aggregation(aggregation: Aggregation, config: &DetectionConfig) -> Self {
        let verdicts = detect_all(&aggregation.per_ip, config);
        Self::with_verdicts(aggregation, verdicts)
    }

    /// Pentru verdicte calculate în altă parte (ex: verdictele persistente
    /// ale colectorului live).
    pub fn with_verdicts(aggregation: Aggregation, verdicts: BTreeMap<String, ScanVerdict>) -> Self {
        let rows = report::build(&aggregation.per_ip, &verdicts);
        Analysis {
            aggregation,
            verdicts,
            rows,
        }
    }

    pub fn summary(&self) -> ReportSummary {
        report::summarize(&self.rows)
    }

    /// Verdictele pozitive, în ordinea IP-urilor
    pub fn scans(&self) -> impl Iterator<Item = &ScanVerdict> {
        self.verdicts.values().filter(|v| v.is_scan)
    }
}

pub fn analyze_lines<I, S>(lines: I, parser: &dyn LineParser, config: &DetectionConfig) -> Analysis
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Analysis::from_aggregation(crate::aggregator::aggregate(lines, parser), config)
}

// ---------------------------------------------------------------------------
// Citește linie cu linie dintr-un `BufRead`.
//
// Octeții non-UTF-8 sunt înlocuiți (`from_utf8_lossy`): o linie stricată
// devine cel mult o linie neparsată, nu o eroare de citire.
// `origin` apare doar în mesajul de eroare.
// ---------------------------------------------------------------------------
pub fn analyze_reader<R: BufRead>(
    mut reader: R,
    origin: &Path,
    parser: &dyn LineParser,
    config: &DetectionConfig,
) -> Result<Analysis, AnalysisError> {
    let mut aggregator = Aggregator::new(parser);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| AnalysisError::SourceUnavailable {
                path: origin.to_path_buf(),
                source,
            })?;
        if read == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        aggregator.push_line(line.trim_end_matches(['\r', '\n']));
    }

    let aggregation = aggregator.finish();
    info!(
        lines = aggregation.lines_seen,
        unparsed = aggregation.unparsed,
        ips = aggregation.unique_ips(),
        "agregare terminată"
    );
    Ok(Analysis::from_aggregation(aggregation, config))
}

pub fn analyze_path(
    path: &Path,
    parser: &dyn LineParser,
    config: &DetectionConfig,
) -> Result<Analysis, AnalysisError> {
    let file = File::open(path).map_err(|source| AnalysisError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    analyze_reader(BufReader::new(file), path, parser, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FormatChain;
    use std::io::Cursor;

    #[test]
    fn reader_handles_crlf_and_missing_final_newline() {
        let input = "1.0 10.0.0.1:0 > 10.0.0.2:22\r\n2.0 10.0.0.1:0 > 10.0.0.2:80";
        let analysis = analyze_reader(
            Cursor::new(input),
            Path::new("<memorie>"),
            &FormatChain::standard(),
            &DetectionConfig::default(),
        )
        .expect("analysis");

        assert_eq!(analysis.aggregation.lines_seen, 2);
        assert_eq!(analysis.aggregation.unparsed, 0);
        assert_eq!(analysis.rows[0].total_events, 2);
    }

    #[test]
    fn invalid_utf8_becomes_unparsed_line() {
        let mut input = b"1.0 10.0.0.1:0 > 10.0.0.2:22\n".to_vec();
        input.extend_from_slice(&[0xff, 0xfe, b'\n']);

        let analysis = analyze_reader(
            Cursor::new(input),
            Path::new("<memorie>"),
            &FormatChain::standard(),
            &DetectionConfig::default(),
        )
        .expect("analysis");

        assert_eq!(analysis.aggregation.unparsed, 1);
        assert_eq!(analysis.aggregation.parsed(), 1);
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let result = analyze_path(
            Path::new("/nonexistent/scan-analyzer/trafego.txt"),
            &FormatChain::standard(),
            &DetectionConfig::default(),
        );
        assert!(matches!(result, Err(AnalysisError::SourceUnavailable { .. })));
    }
}
