// ============================================================
//  parser/mod.rs - Trait-ul LineParser, FlowEvent și lanțul de formate
// ============================================================
//
//  Concepte Rust demonstrate aici:
//  - `trait` : contractul pe care fiecare format de linie îl implementează
//  - `Box<dyn Trait>` : lanțul de formate ține parsere eterogene
//  - `Iterator::find_map` : primul parser care reușește câștigă
//  - `Option<T>` : o linie nerecunoscută este `None`, nu o eroare
// ============================================================

pub mod conexoes;
pub mod tcpdump;

use once_cell::sync::Lazy;
use tracing::warn;

use conexoes::ConexoesParser;
use tcpdump::TcpdumpParser;

// ---------------------------------------------------------------------------
// Un eveniment de flux deja parsat.
//
// Indiferent de formatul sursă (tcpdump cu secunde, tcpdump cu oră,
// tabel de conexiuni), odată parsată, orice linie devine un `FlowEvent`.
// IP-ul sursă rămâne text: este doar o cheie de grupare.
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct FlowEvent {
    /// Secunde în sesiunea de captură (nu timp absolut)
    pub timestamp: f64,

    /// IP-ul sursă, așa cum apare în linie (ex: "192.168.1.100")
    pub source_ip: String,

    /// Portul destinație; 0 = nume de serviciu necunoscut
    pub dest_port: u16,
}

// ---------------------------------------------------------------------------
// Trăsătura LineParser - "interfața" pe care orice format o implementează.
//
// `Send + Sync` pentru că listener-ul UDP partajează parser-ul între
// task-uri tokio printr-un `Arc`.
// ---------------------------------------------------------------------------
pub trait LineParser: Send + Sync {
    /// `Some(event)` la potrivire structurală, `None` altfel.
    fn parse(&self, line: &str) -> Option<FlowEvent>;

    /// Numele parser-ului (pentru logging și diagnostice)
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Lanțul de formate: o listă ordonată de parsere, încercate în ordinea
// priorității. Prima potrivire structurală este rezultatul.
//
// Lanțul este el însuși un `LineParser`, deci apelantul nu știe dacă
// lucrează cu un singur format sau cu toate.
// ---------------------------------------------------------------------------
pub struct FormatChain {
    name:    String,
    parsers: Vec<Box<dyn LineParser>>,
}

impl FormatChain {
    pub fn new(name: &str, parsers: Vec<Box<dyn LineParser>>) -> Self {
        FormatChain {
            name: name.to_string(),
            parsers,
        }
    }

    /// Toate gramaticile acceptate, în ordinea fixă de prioritate.
    pub fn standard() -> Self {
        FormatChain::new(
            "auto",
            vec![
                Box::new(TcpdumpParser::seconds()),
                Box::new(TcpdumpParser::clock()),
                Box::new(ConexoesParser::new()),
            ],
        )
    }

    /// Doar cele două variante tcpdump.
    pub fn tcpdump() -> Self {
        FormatChain::new(
            "tcpdump",
            vec![
                Box::new(TcpdumpParser::seconds()),
                Box::new(TcpdumpParser::clock()),
            ],
        )
    }

    pub fn formats(&self) -> Vec<&str> {
        self.parsers.iter().map(|p| p.name()).collect()
    }
}

impl LineParser for FormatChain {
    fn parse(&self, line: &str) -> Option<FlowEvent> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        self.parsers.iter().find_map(|p| p.parse(line))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// Lanțul implicit, construit o singură dată (regex-urile din interior sunt
// oricum `Lazy`, dar nu are rost să realocăm vectorul de parsere).
static DEFAULT_CHAIN: Lazy<FormatChain> = Lazy::new(FormatChain::standard);

/// Parsează o linie cu toate formatele acceptate.
pub fn parse_line(line: &str) -> Option<FlowEvent> {
    DEFAULT_CHAIN.parse(line)
}

// ---------------------------------------------------------------------------
// Factory function: creează parser-ul potrivit pe baza configurației
//
//   "auto"     -> toate formatele (implicit)
//   "tcpdump"  -> doar ieșirea tcpdump
//   "conexoes" -> doar tabelul de conexiuni
// ---------------------------------------------------------------------------
pub fn create_parser(format: &str) -> Box<dyn LineParser> {
    match format.to_lowercase().as_str() {
        "auto" => Box::new(FormatChain::standard()),
        "tcpdump" => Box::new(FormatChain::tcpdump()),
        "conexoes" => Box::new(ConexoesParser::new()),
        unknown => {
            warn!(requested = unknown, "format de intrare necunoscut, se folosește 'auto'");
            Box::new(FormatChain::standard())
        }
    }
}

/// Tabelul fix de servicii; orice alt nume rezolvă la portul 0.
pub fn service_port(service: &str) -> u16 {
    match service.to_ascii_lowercase().as_str() {
        "http"   => 80,
        "https"  => 443,
        "ssh"    => 22,
        "ftp"    => 21,
        "domain" => 53,
        "smtp"   => 25,
        "pop3"   => 110,
        "imap"   => 143,
        _        => 0,
    }
}

// Un token numeric peste 65535 nu este un port: linia e respinsă.
pub(crate) fn resolve_port(token: &str) -> Option<u16> {
    if token.bytes().all(|b| b.is_ascii_digit()) {
        token.parse().ok()
    } else {
        Some(service_port(token))
    }
}

/// "12.345678" -> 12.345678; orice eșec -> 0.0
pub(crate) fn seconds_or_zero(raw: &str) -> f64 {
    raw.parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .unwrap_or(0.0)
}

/// "HH:MM:SS[.frac]" -> secunde de la miezul nopții; orice eșec -> 0.0
pub(crate) fn clock_or_zero(raw: &str) -> f64 {
    parse_clock(raw).unwrap_or(0.0)
}

fn parse_clock(raw: &str) -> Option<f64> {
    let mut parts = raw.splitn(3, ':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;

    let total = hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds;
    total.is_finite().then_some(total)
}
