// ============================================================
//  parser/tcpdump.rs - Parser pentru ieșirea text a tcpdump
// ============================================================
//
//  Format linie exemplu (tcpdump -nn -tt / -ttt):
//  0.000123 IP 192.168.1.100.51234 > 10.0.0.1.80: Flags [S], seq 1
//
//  Format linie exemplu (tcpdump -nn, timestamp ca oră):
//  15:12:20.482910 IP 192.168.1.100.51234 > 10.0.0.1.https: Flags [S]
//
//  Câmpuri extrase:
//    - Timestamp : secunde zecimale SAU HH:MM:SS.frac
//    - IP sursă  : 192.168.1.100 (portul sursă poate lipsi)
//    - Port dest.: 80, sau nume de serviciu (https -> 443)
// ============================================================

use super::{clock_or_zero, resolve_port, seconds_or_zero, FlowEvent, LineParser};
use once_cell::sync::Lazy;
use regex::Regex;

// Adresă IPv4 în format dotted-quad. Nu validăm octeții (999.1.1.1 trece):
// IP-ul este doar o cheie de grupare. `[0-9]`, nu `\d`: în `regex`, `\d`
// acceptă și cifre Unicode.
const IPV4: &str = r"[0-9]{1,3}(?:\.[0-9]{1,3}){3}";

// Partea comună după timestamp:
//   IP <sursă>[.<sport>] > <dest>.<dport|serviciu> urmat de ':' / spațiu / final
fn flow_tail() -> String {
    format!(
        r"\s+IP\s+({ip})(?:\.[0-9]+)?\s+>\s+{ip}\.([A-Za-z0-9][A-Za-z0-9_-]*)(?::|\s|$)",
        ip = IPV4
    )
}

static SECONDS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*([0-9]+\.[0-9]+){}", flow_tail()))
        .expect("SECONDS_REGEX: pattern invalid - eroare de programare!")
});

static CLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*([0-9]+:[0-9]+:[0-9]+(?:\.[0-9]+)?){}", flow_tail()))
        .expect("CLOCK_REGEX: pattern invalid - eroare de programare!")
});

/// Cum este scris timestamp-ul la începutul liniei.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampStyle {
    /// `12.345678`
    Seconds,
    /// `15:12:20.482910`
    Clock,
}

pub struct TcpdumpParser {
    style: TimestampStyle,
}

impl TcpdumpParser {
    pub fn seconds() -> Self {
        TcpdumpParser {
            style: TimestampStyle::Seconds,
        }
    }

    pub fn clock() -> Self {
        TcpdumpParser {
            style: TimestampStyle::Clock,
        }
    }

    fn regex(&self) -> &'static Regex {
        match self.style {
            TimestampStyle::Seconds => Lazy::force(&SECONDS_REGEX),
            TimestampStyle::Clock => Lazy::force(&CLOCK_REGEX),
        }
    }
}

impl LineParser for TcpdumpParser {
    fn name(&self) -> &str {
        match self.style {
            TimestampStyle::Seconds => "tcpdump (secunde)",
            TimestampStyle::Clock => "tcpdump (oră)",
        }
    }

    fn parse(&self, line: &str) -> Option<FlowEvent> {
        let caps = self.regex().captures(line)?;

        let raw_ts = caps.get(1)?.as_str();
        // Un timestamp care nu se poate converti nu respinge linia
        let timestamp = match self.style {
            TimestampStyle::Seconds => seconds_or_zero(raw_ts),
            TimestampStyle::Clock => clock_or_zero(raw_ts),
        };

        let source_ip = caps.get(2)?.as_str().to_string();
        let dest_port = resolve_port(caps.get(3)?.as_str())?;

        Some(FlowEvent {
            timestamp,
            source_ip,
            dest_port,
        })
    }
}
