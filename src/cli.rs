use clap::{Args, Parser, Subcommand};
use scan_analyzer::config::Config;
use std::path::PathBuf;

/// scan-analyzer - analiză de trafic și detecție Port Scan.
///
/// Citește linii text produse de tcpdump sau de un colector al tabelului
/// de conexiuni și scrie un raport CSV per IP sursă.
#[derive(Parser, Debug)]
#[command(
    name    = "scan-analyzer",
    version,
    about   = "Analizor de trafic - detecție Port Scan",
    long_about = None,
)]
pub struct Cli {
    /// Fișierul de configurare TOML (implicit: ./config.toml, dacă există)
    #[arg(short = 'c', long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analizează un fișier de trafic ("-" = stdin) și scrie raportul CSV
    Analyze(AnalyzeArgs),

    /// Primește linii de trafic pe UDP și rescrie raportul periodic
    Listen(ListenArgs),

    /// Afișează statisticile unui raport existent
    Stats(StatsArgs),

    /// Generează trafic de exemplu și îl analizează
    Demo(DemoArgs),
}

// ── Suprascrieri comune pentru detecție ──────────────────────────────────────

#[derive(Args, Debug, Clone, Default)]
pub struct DetectionArgs {
    /// Formatul liniilor: auto, tcpdump, conexoes
    #[arg(long = "format", value_name = "FORMAT")]
    pub format: Option<String>,

    /// Fereastra glisantă, în secunde
    #[arg(long = "window", value_name = "SECS")]
    pub window_secs: Option<f64>,

    /// Alerta la mai mult de N porturi distincte în fereastră
    #[arg(long = "threshold", value_name = "N")]
    pub port_threshold: Option<usize>,

    /// Unde se scrie raportul CSV
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl DetectionArgs {
    /// Valorile date în linia de comandă câștigă în fața config.toml.
    pub fn apply(&self, config: &mut Config) {
        if let Some(format) = &self.format {
            config.input.format = format.clone();
        }
        if let Some(window) = self.window_secs {
            config.detection.window_secs = window;
        }
        if let Some(threshold) = self.port_threshold {
            config.detection.port_threshold = threshold;
        }
        if let Some(output) = &self.output {
            config.report.path = output.clone();
        }
    }
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Fișierul de trafic (implicit: input.path din config)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub detection: DetectionArgs,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Adresa de bind (implicit: listener.bind_address)
    #[arg(long = "bind", value_name = "ADDR")]
    pub bind_address: Option<String>,

    /// Portul UDP (implicit: listener.port)
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub port: Option<u16>,

    /// Afișează fiecare flux parsat
    #[arg(long = "show-flows")]
    pub show_flows: bool,

    #[command(flatten)]
    pub detection: DetectionArgs,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Raportul CSV (implicit: report.path din config)
    #[arg(value_name = "REPORT")]
    pub report: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Unde se scrie traficul de exemplu
    #[arg(long = "sample", value_name = "PATH", default_value = "trafego_exemplo.txt")]
    pub sample: PathBuf,

    #[command(flatten)]
    pub detection: DetectionArgs,
}
