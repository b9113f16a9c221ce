// ============================================================
//  parser/conexoes.rs - Parser pentru tabelul de conexiuni
// ============================================================
//
//  Formatul scris de colectorul care interoghează tabelul de conexiuni
//  al sistemului de operare (o linie per conexiune ESTABLISHED):
//
//  12.004 192.168.1.100:0 > 8.8.8.8:443 PID:1234
//
//  Separatorul IP/port este ':' (nu '.' ca la tcpdump), iar portul sursă
//  lipsește adesea sau este 0.
// ============================================================

use super::{resolve_port, seconds_or_zero, FlowEvent, LineParser};
use once_cell::sync::Lazy;
use regex::Regex;

static CONEXOES_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*([0-9]+(?:\.[0-9]+)?)\s+([0-9]{1,3}(?:\.[0-9]{1,3}){3}):[0-9]*\s+>\s+[0-9]{1,3}(?:\.[0-9]{1,3}){3}:([A-Za-z0-9][A-Za-z0-9_-]*)(?:\s|$)",
    )
    .expect("CONEXOES_REGEX: pattern invalid - eroare de programare!")
});

pub struct ConexoesParser;

impl ConexoesParser {
    pub fn new() -> Self {
        ConexoesParser
    }
}

impl Default for ConexoesParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser for ConexoesParser {
    fn name(&self) -> &str {
        "tabel conexiuni"
    }

    fn parse(&self, line: &str) -> Option<FlowEvent> {
        let caps = CONEXOES_REGEX.captures(line)?;

        Some(FlowEvent {
            timestamp: seconds_or_zero(caps.get(1)?.as_str()),
            source_ip: caps.get(2)?.as_str().to_string(),
            dest_port: resolve_port(caps.get(3)?.as_str())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_poller_line_with_pid() {
        let ev = ConexoesParser::new()
            .parse("12.004 192.168.1.100:0 > 8.8.8.8:443 PID:1234")
            .expect("match");
        assert_eq!(ev.timestamp, 12.004);
        assert_eq!(ev.source_ip, "192.168.1.100");
        assert_eq!(ev.dest_port, 443);
    }

    #[test]
    fn integer_timestamp_and_empty_source_port() {
        let ev = ConexoesParser::new()
            .parse("30 10.0.0.15: > 192.168.1.1:1005")
            .expect("match");
        assert_eq!(ev.timestamp, 30.0);
        assert_eq!(ev.dest_port, 1005);
    }

    #[test]
    fn service_token_and_end_of_line() {
        let ev = ConexoesParser::new()
            .parse("1.0 10.0.0.1:5555 > 10.0.0.2:ssh")
            .expect("match");
        assert_eq!(ev.dest_port, 22);
    }

    #[test]
    fn tcpdump_lines_are_not_connection_lines() {
        let parser = ConexoesParser::new();
        assert!(parser.parse("1.0 IP 10.0.0.1.5555 > 10.0.0.2.22: Flags [S]").is_none());
        assert!(parser.parse("# Timestamp IP_Origem Porta_Destino IP_Destino PID").is_none());
        assert!(parser.parse("1.0 10.0.0.1:5555 > 10.0.0.2:99999").is_none());
    }

    #[test]
    fn non_ascii_digits_are_rejected() {
        let parser = ConexoesParser::new();
        assert!(parser.parse("1.0 ١٠.٠.٠.١:0 > 10.0.0.2:80").is_none());
        assert!(parser.parse("1.0 10.0.0.1:0 > 10.0.0.2:٨٠").is_none());
        assert!(parser.parse("١.0 10.0.0.1:0 > 10.0.0.2:80").is_none());
    }
}
