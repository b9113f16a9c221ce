// ============================================================
//  error.rs - Erorile fazelor de I/O ale analizei
// ============================================================
//
//  Liniile malformate NU sunt erori: sunt numărate în `Aggregation`
//  și analiza continuă. Aici stau doar eșecurile care opresc o fază:
//  sursa nu poate fi citită sau raportul nu poate fi scris / citit.
// ============================================================

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Sursa de trafic nu poate fi deschisă sau citită. Nu se emite raport.
    #[error("sursa de trafic '{}' nu poate fi citită", path.display())]
    SourceUnavailable {
        path:   PathBuf,
        source: io::Error,
    },

    /// Raportul nu a putut fi scris. Rezultatul rămâne în memorie.
    #[error("raportul nu a putut fi scris în '{}'", path.display())]
    SinkWriteFailure {
        path:   PathBuf,
        source: csv::Error,
    },

    /// Un raport anterior nu poate fi încărcat (comanda `stats`).
    #[error("raportul '{}' nu poate fi citit", path.display())]
    ReportUnreadable {
        path:   PathBuf,
        source: csv::Error,
    },
}
