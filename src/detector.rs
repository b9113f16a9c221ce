// ============================================================
//  detector.rs - Detecția Port Scan cu fereastră glisantă
// ============================================================
//
//  Concepte Rust demonstrate:
//  - `VecDeque` ca coadă FIFO: intră la spate, ies din față
//  - `HashMap<u16, usize>` ca multiset (port -> număr de apariții)
//  - API-ul `Entry` pentru a decrementa și șterge într-un singur lookup
//  - Funcții pure (fără side-effects) - ușor de testat
// ============================================================

use crate::aggregator::PerIpState;
use crate::config::DetectionConfig;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::debug;

// ---------------------------------------------------------------------------
// Fereastra glisantă incrementală.
//
// Fiecare eveniment intră o dată și iese o dată din coadă, deci costul
// total este O(n) amortizat. Un port dispare din setul distinct DOAR când
// ultima lui apariție iese din fereastră.
// ---------------------------------------------------------------------------
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    window: f64,
    queue:  VecDeque<(f64, u16)>,
    refs:   HashMap<u16, usize>,
}

impl SlidingWindow {
    pub fn new(window_secs: f64) -> Self {
        SlidingWindow {
            window: window_secs,
            queue:  VecDeque::new(),
            refs:   HashMap::new(),
        }
    }

    /// Adaugă `(t, port)` și returnează numărul de porturi distincte din
    /// fereastră după inserare. `t` trebuie să fie >= ultimul `t` adăugat.
    pub fn push(&mut self, t: f64, port: u16) -> usize {
        self.evict_older_than(t);
        self.queue.push_back((t, port));
        *self.refs.entry(port).or_insert(0) += 1;
        self.refs.len()
    }

    // Strict mai vechi decât fereastra: la exact `window` secunde
    // intrarea rămâne.
    fn evict_older_than(&mut self, now: f64) {
        while let Some(&(t0, p0)) = self.queue.front() {
            if now - t0 <= self.window {
                break;
            }
            self.queue.pop_front();

            if let Entry::Occupied(mut slot) = self.refs.entry(p0) {
                *slot.get_mut() -= 1;
                if *slot.get() == 0 {
                    slot.remove();
                }
            }
        }
    }

    pub fn distinct(&self) -> usize {
        self.refs.len()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Verdictul pentru un IP sursă.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanVerdict {
    pub source_ip: String,
    pub is_scan:   bool,

    /// Cel mai mare număr de porturi distincte văzut într-o fereastră
    /// (până la oprire, dacă pragul a fost depășit)
    pub peak_ports: usize,
}

impl ScanVerdict {
    /// Eticheta pentru logging
    pub fn label(&self) -> &str {
        if self.is_scan {
            "PORT_SCAN"
        } else {
            "CLEAN"
        }
    }
}

/// Sortare stabilă după timestamp: la egalitate rămâne ordinea de sosire.
pub fn sorted_by_time(events: &[(f64, u16)]) -> Vec<(f64, u16)> {
    let mut sorted = events.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
    sorted
}

// Rulează fereastra și se oprește la prima depășire a pragului.
// Returnează (is_scan, peak_ports).
fn scan_window(events: &[(f64, u16)], config: &DetectionConfig) -> (bool, usize) {
    let mut window = SlidingWindow::new(config.window_secs);
    let mut peak = 0;

    for (t, port) in sorted_by_time(events) {
        let distinct = window.push(t, port);
        peak = peak.max(distinct);
        if distinct > config.port_threshold {
            return (true, peak);
        }
    }
    (false, peak)
}

/// `true` dacă într-o fereastră oarecare de `window_secs` apar mai mult de
/// `port_threshold` porturi destinație distincte.
pub fn detect(events: &[(f64, u16)], config: &DetectionConfig) -> bool {
    scan_window(events, config).0
}

pub fn evaluate(source_ip: &str, state: &PerIpState, config: &DetectionConfig) -> ScanVerdict {
    let (is_scan, peak_ports) = scan_window(&state.ordered_events, config);
    let verdict = ScanVerdict {
        source_ip: source_ip.to_string(),
        is_scan,
        peak_ports,
    };
    debug!(
        ip = source_ip,
        events = state.total_events,
        peak_ports,
        verdict = verdict.label(),
        "verdict"
    );
    verdict
}

/// Un verdict pentru fiecare IP agregat; niciun IP nu este omis.
pub fn detect_all(
    per_ip: &HashMap<String, PerIpState>,
    config: &DetectionConfig,
) -> BTreeMap<String, ScanVerdict> {
    per_ip
        .iter()
        .map(|(ip, state)| (ip.clone(), evaluate(ip, state, config)))
        .collect()
}
