// ============================================================
//  aggregator.rs - Gruparea evenimentelor pe IP sursă
// ============================================================
//
//  Concepte Rust demonstrate:
//  - `HashMap::entry().or_default()` : caută sau creează starea IP-ului
//  - Generic peste `IntoIterator<Item = S>` cu `S: AsRef<str>` :
//    aceeași funcție acceptă `Vec<String>`, `&[&str]`, `lines()`...
//  - Împrumut pe durata agregării: `Aggregator<'p>` ține o referință
//    la parser, nu îl deține
// ============================================================

use crate::parser::{FlowEvent, LineParser};
use std::collections::HashMap;
use tracing::debug;

/// Câte linii neparsate păstrăm ca exemplu pentru operator.
pub const MAX_UNPARSED_SAMPLES: usize = 3;

// ---------------------------------------------------------------------------
// Starea unui IP sursă pe durata unei analize.
//
// `ordered_events` păstrează ordinea de sosire (NU ordinea timpului);
// detectorul sortează singur.
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerIpState {
    pub total_events:   usize,
    pub ordered_events: Vec<(f64, u16)>,
}

impl PerIpState {
    pub fn record(&mut self, timestamp: f64, dest_port: u16) {
        self.ordered_events.push((timestamp, dest_port));
        self.total_events += 1;
    }

    /// Cel mai mare timestamp înregistrat
    pub fn latest(&self) -> Option<f64> {
        self.ordered_events
            .iter()
            .map(|&(t, _)| t)
            .max_by(|a, b| a.total_cmp(b))
    }

    // -----------------------------------------------------------------------
    // Uită evenimentele care au ieșit deja din fereastră față de `latest`
    // (`latest - t > window_secs`, aceeași condiție ca la evacuare).
    //
    // Doar primele `evaluated` evenimente sunt candidate: cele sosite după
    // ultima evaluare rămân până când detectorul le vede măcar o dată.
    // `total_events` nu se schimbă. Returnează câte evenimente au fost uitate.
    // -----------------------------------------------------------------------
    pub fn forget_expired(&mut self, latest: f64, window_secs: f64, evaluated: usize) -> usize {
        let before = self.ordered_events.len();
        let mut index = 0;
        self.ordered_events.retain(|&(t, _)| {
            let keep = index >= evaluated || latest - t <= window_secs;
            index += 1;
            keep
        });
        before - self.ordered_events.len()
    }
}

/// Rezultatul agregării: starea per IP plus diagnosticele de parsare.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub per_ip: HashMap<String, PerIpState>,

    /// Linii care nu au corespuns niciunui format (inclusiv cele goale)
    pub unparsed: usize,

    /// Total linii consumate
    pub lines_seen: usize,

    /// Primele câteva linii neparsate, deja `trim()`-uite
    pub unparsed_samples: Vec<String>,
}

impl Aggregation {
    pub fn record_event(&mut self, event: FlowEvent) {
        self.lines_seen += 1;
        self.per_ip
            .entry(event.source_ip)
            .or_default()
            .record(event.timestamp, event.dest_port);
    }

    pub fn record_unparsed(&mut self, line: &str) {
        self.lines_seen += 1;
        self.unparsed += 1;
        if self.unparsed_samples.len() < MAX_UNPARSED_SAMPLES {
            self.unparsed_samples.push(line.trim().to_string());
        }
    }

    pub fn parsed(&self) -> usize {
        self.lines_seen - self.unparsed
    }

    pub fn unique_ips(&self) -> usize {
        self.per_ip.len()
    }

    /// IP-urile sortate, pentru afișare deterministă
    pub fn sorted_ips(&self) -> Vec<&str> {
        let mut ips: Vec<&str> = self.per_ip.keys().map(String::as_str).collect();
        ips.sort_unstable();
        ips
    }
}

// ---------------------------------------------------------------------------
// Agregatorul incremental: primește linie cu linie (util pentru surse
// nelimitate, ex: stdin de la `tcpdump -l`) și la final predă `Aggregation`.
// ---------------------------------------------------------------------------
pub struct Aggregator<'p> {
    parser: &'p dyn LineParser,
    state:  Aggregation,
}

impl<'p> Aggregator<'p> {
    pub fn new(parser: &'p dyn LineParser) -> Self {
        Aggregator {
            parser,
            state: Aggregation::default(),
        }
    }

    /// Returnează `true` dacă linia a produs un eveniment.
    pub fn push_line(&mut self, line: &str) -> bool {
        match self.parser.parse(line) {
            Some(event) => {
                self.state.record_event(event);
                true
            }
            None => {
                debug!(line = line.trim(), "linie neparsată");
                self.state.record_unparsed(line);
                false
            }
        }
    }

    pub fn lines_seen(&self) -> usize {
        self.state.lines_seen
    }

    pub fn finish(self) -> Aggregation {
        self.state
    }
}

/// Agregă o secvență finită de linii, în ordinea de sosire.
pub fn aggregate<I, S>(lines: I, parser: &dyn LineParser) -> Aggregation
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut aggregator = Aggregator::new(parser);
    for line in lines {
        aggregator.push_line(line.as_ref());
    }
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FormatChain;

    #[test]
    fn groups_by_source_ip_preserving_arrival_order() {
        let lines = [
            "5.0 IP 10.0.0.1.1000 > 10.0.0.9.80: x",
            "1.0 IP 10.0.0.2.1000 > 10.0.0.9.22: x",
            "2.0 IP 10.0.0.1.1000 > 10.0.0.9.443: x",
        ];
        let agg = aggregate(lines, &FormatChain::standard());

        assert_eq!(agg.unique_ips(), 2);
        let first = &agg.per_ip["10.0.0.1"];
        assert_eq!(first.total_events, 2);
        // Nicio reordonare: 5.0 rămâne înaintea lui 2.0
        assert_eq!(first.ordered_events, vec![(5.0, 80), (2.0, 443)]);
        assert_eq!(agg.sorted_ips(), vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn malformed_lines_are_counted_and_sampled() {
        let lines = vec![
            "garbage one".to_string(),
            String::new(),
            "  garbage three  ".to_string(),
            "garbage four".to_string(),
            "1.0 IP 10.0.0.1.1 > 10.0.0.2.80: x".to_string(),
        ];
        let agg = aggregate(&lines, &FormatChain::standard());

        assert_eq!(agg.unparsed, 4);
        assert_eq!(agg.lines_seen, 5);
        assert_eq!(agg.parsed(), 1);
        assert_eq!(agg.unparsed_samples, vec!["garbage one", "", "garbage three"]);
    }

    #[test]
    fn forget_expired_keeps_window_and_unevaluated_tail() {
        let mut state = PerIpState::default();
        for &(t, p) in &[(0.0, 1), (40.0, 2), (100.0, 3), (10.0, 4)] {
            state.record(t, p);
        }
        assert_eq!(state.latest(), Some(100.0));

        // Doar primele 3 au fost evaluate; (10.0, 4) a sosit după
        let dropped = state.forget_expired(100.0, 60.0, 3);
        assert_eq!(dropped, 1);
        assert_eq!(state.ordered_events, vec![(40.0, 2), (100.0, 3), (10.0, 4)]);
        assert_eq!(state.total_events, 4);

        // La exact `window_secs` evenimentul rămâne
        assert_eq!(state.forget_expired(100.0, 60.0, 4), 1);
        assert_eq!(state.ordered_events, vec![(40.0, 2), (100.0, 3)]);
    }

    #[test]
    fn streaming_push_matches_batch() {
        let chain = FormatChain::standard();
        let mut aggregator = Aggregator::new(&chain);
        assert!(aggregator.push_line("1.0 10.0.0.1:0 > 10.0.0.2:22"));
        assert!(!aggregator.push_line("???"));
        assert_eq!(aggregator.lines_seen(), 2);

        let agg = aggregator.finish();
        assert_eq!(agg.per_ip["10.0.0.1"].ordered_events, vec![(1.0, 22)]);
        assert_eq!(agg.unparsed, 1);
    }
}
