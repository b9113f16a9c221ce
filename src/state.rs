// ============================================================
//  state.rs - Colectorul live partajat (thread-safe)
// ============================================================
//
//  Concepte Rust demonstrate:
//  - `Arc<T>`: partajarea ownership-ului între task-urile tokio
//  - `DashMap<K, V>`: HashMap concurrent cu lock per shard, fără un
//    Mutex global - fiecare datagramă UDP e procesată în task-ul ei
//  - `AtomicUsize`: contor fără lock pentru liniile neparsate
//  - `Clone` derivat: clonează doar Arc-urile, nu datele
//  - `Vec::retain` : istoria fiecărui IP e tăiată la fereastră după
//    fiecare evaluare, deci memoria rămâne mărginită
// ============================================================

use crate::aggregator::{Aggregation, PerIpState};
use crate::analysis::Analysis;
use crate::config::DetectionConfig;
use crate::detector::{detect_all, ScanVerdict};
use crate::parser::{FlowEvent, LineParser};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

// ---------------------------------------------------------------------------
// Starea sesiunii live.
//
// Task-urile concurente pot înregistra evenimentele aceluiași IP în altă
// ordine decât au sosit pe rețea. Nu contează: detectorul sortează după
// timestamp înainte de a rula fereastra.
// ---------------------------------------------------------------------------
#[derive(Clone)]
pub struct SharedState {
    /// Key: IP sursă | Value: totalul și evenimentele (timestamp, port)
    pub per_ip: Arc<DashMap<String, PerIpState>>,

    pub unparsed: Arc<AtomicUsize>,

    /// Ultimul verdict per IP. Odată `is_scan`, rămâne `is_scan`, chiar
    /// dacă evenimentele care l-au produs au fost uitate.
    pub verdicts: Arc<DashMap<String, ScanVerdict>>,
}

/// Rezultatul unei evaluări periodice a colectorului live.
#[derive(Debug, Clone)]
pub struct LiveFlush {
    pub analysis: Analysis,

    /// IP-urile al căror verdict a devenit `is_scan` la această evaluare
    pub new_alerts: Vec<ScanVerdict>,

    /// Evenimente ieșite din fereastră și eliberate din memorie
    pub forgotten: usize,
}

impl SharedState {
    pub fn new() -> Self {
        SharedState {
            per_ip:   Arc::new(DashMap::new()),
            unparsed: Arc::new(AtomicUsize::new(0)),
            verdicts: Arc::new(DashMap::new()),
        }
    }

    pub fn record_event(&self, event: FlowEvent) {
        self.per_ip
            .entry(event.source_ip)
            .or_default()
            .record(event.timestamp, event.dest_port);
    }

    pub fn record_unparsed(&self) {
        self.unparsed.fetch_add(1, Ordering::Relaxed);
    }

    /// Parsează și înregistrează o linie; returnează evenimentul, dacă există.
    pub fn ingest_line(&self, parser: &dyn LineParser, line: &str) -> Option<FlowEvent> {
        match parser.parse(line) {
            Some(event) => {
                self.record_event(event.clone());
                Some(event)
            }
            None => {
                self.record_unparsed();
                None
            }
        }
    }

    pub fn ip_count(&self) -> usize {
        self.per_ip.len()
    }

    // -----------------------------------------------------------------------
    // Copie punctuală într-o `Aggregation` obișnuită, pe care rulează
    // detectorul. `lines_seen` este derivat din copia însăși, ca relația
    // parsate + neparsate == văzute să țină chiar dacă alte task-uri
    // scriu în timpul copierii.
    // -----------------------------------------------------------------------
    pub fn snapshot(&self) -> Aggregation {
        let per_ip: HashMap<String, PerIpState> = self
            .per_ip
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let unparsed = self.unparsed.load(Ordering::Relaxed);
        let parsed: usize = per_ip.values().map(|s| s.total_events).sum();

        Aggregation {
            per_ip,
            unparsed,
            lines_seen: parsed + unparsed,
            unparsed_samples: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Evaluarea periodică (tick-ul de flush și oprirea):
    //   1. copie punctuală + detecție pe evenimentele reținute
    //   2. îmbinare cu verdictele anterioare (un scan nu se anulează)
    //   3. se uită evenimentele evaluate care au ieșit din fereastră
    //
    // Un eveniment cu `latest - t > window_secs` nu mai poate intra în
    // aceeași fereastră cu un eveniment viitor cu `t >= latest`.
    // Apelurile `flush` nu trebuie să se suprapună; bucla principală le
    // face secvențial.
    // -----------------------------------------------------------------------
    pub fn flush(&self, config: &DetectionConfig) -> LiveFlush {
        let aggregation = self.snapshot();
        let mut verdicts = detect_all(&aggregation.per_ip, config);

        let mut new_alerts = Vec::new();
        for (ip, verdict) in verdicts.iter_mut() {
            let mut known = self.verdicts.entry(ip.clone()).or_insert_with(|| ScanVerdict {
                source_ip:  ip.clone(),
                is_scan:    false,
                peak_ports: 0,
            });

            let first_trip = verdict.is_scan && !known.is_scan;
            verdict.is_scan |= known.is_scan;
            verdict.peak_ports = verdict.peak_ports.max(known.peak_ports);
            *known = verdict.clone();

            if first_trip {
                new_alerts.push(verdict.clone());
            }
        }

        // (IP, câte evenimente au fost evaluate, cel mai recent timestamp)
        let evaluated: Vec<(String, usize, f64)> = aggregation
            .per_ip
            .iter()
            .filter_map(|(ip, s)| s.latest().map(|latest| (ip.clone(), s.ordered_events.len(), latest)))
            .collect();

        let mut forgotten = 0;
        for (ip, count, latest) in evaluated {
            if let Some(mut entry) = self.per_ip.get_mut(&ip) {
                forgotten += entry.forget_expired(latest, config.window_secs, count);
            }
        }
        if forgotten > 0 {
            debug!(forgotten, "evenimente ieșite din fereastră eliberate");
        }

        LiveFlush {
            analysis: Analysis::with_verdicts(aggregation, verdicts),
            new_alerts,
            forgotten,
        }
    }

    /// Câte evenimente (timestamp, port) sunt încă reținute în memorie.
    pub fn retained_events(&self) -> usize {
        self.per_ip.iter().map(|entry| entry.ordered_events.len()).sum()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
