// ============================================================
//  main.rs - Punctul de intrare al analizorului
// ============================================================
//
//  Concepte Rust demonstrate:
//  - `#[tokio::main]` : runtime-ul tokio pentru modul `listen`
//  - `tokio::select!` : așteptăm simultan date UDP, tick-ul de flush
//    și Ctrl-C
//  - `Arc<dyn Trait>` : parser-ul partajat între task-uri
//  - Subcomenzi `clap` care suprascriu config.toml
// ============================================================

mod cli;

use cli::{AnalyzeArgs, Cli, Command, DemoArgs, ListenArgs, StatsArgs};
use scan_analyzer::analysis::{analyze_path, analyze_reader, Analysis};
use scan_analyzer::config::Config;
use scan_analyzer::parser::{self, LineParser};
use scan_analyzer::state::SharedState;
use scan_analyzer::{display, report, sample};

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Inițializare tracing subscriber
    //
    // `RUST_LOG=scan_analyzer=debug` arată și liniile neparsate.
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("scan_analyzer=info")),
        )
        .without_time() // Gestionăm manual timestamp-urile în display.rs
        .compact()
        .init();

    let cli = Cli::parse();

    display::print_banner();

    let config = Config::load_or_default(cli.config.as_deref())
        .context("Eroare fatală: configurația nu a putut fi încărcată")?;

    match cli.command {
        Command::Analyze(args) => run_analyze(args, config),
        Command::Listen(args) => run_listen(args, config).await,
        Command::Stats(args) => run_stats(args, config),
        Command::Demo(args) => run_demo(args, config),
    }
}

// ---------------------------------------------------------------------------
// analyze: fișier sau stdin -> raport CSV
// ---------------------------------------------------------------------------
fn run_analyze(args: AnalyzeArgs, mut config: Config) -> Result<()> {
    args.detection.apply(&mut config);
    if let Some(input) = args.input {
        config.input.path = input;
    }
    config.validate()?;

    let parser = parser::create_parser(&config.input.format);
    log_settings(parser.as_ref(), &config);

    let input = config.input.path.clone();
    let analysis = if input == Path::new("-") {
        display::log_info("Citesc linii de trafic de la stdin ...");
        analyze_reader(io::stdin().lock(), &input, parser.as_ref(), &config.detection)
    } else {
        display::log_info(&format!("Analizez fișierul '{}' ...", input.display()));
        analyze_path(&input, parser.as_ref(), &config.detection)
    }
    .context("Analiza a eșuat, niciun raport nu a fost generat")?;

    finish_analysis(&analysis, &config)
}

// Afișează rezultatul și scrie raportul. Dacă scrierea eșuează, rezultatul
// a fost deja afișat din memorie.
fn finish_analysis(analysis: &Analysis, config: &Config) -> Result<()> {
    display::print_separator();
    display::print_parse_stats(&analysis.aggregation);

    for verdict in analysis.scans() {
        display::log_scan_alert(verdict, config.detection.window_secs);
    }

    display::print_report_table(&analysis.rows);
    display::print_summary(&analysis.summary());

    report::write_report(&config.report.path, &analysis.rows).with_context(|| {
        format!(
            "Raportul ({} rânduri) a rămas doar în memorie",
            analysis.rows.len()
        )
    })?;

    display::log_info(&format!(
        "Raport generat: {}",
        config.report.path.display()
    ));
    Ok(())
}

fn log_settings(parser: &dyn LineParser, config: &Config) {
    display::log_info(&format!(
        "Parser '{}' | fereastră {}s | alertă la >{} porturi distincte",
        parser.name(),
        config.detection.window_secs,
        config.detection.port_threshold
    ));
}

// ---------------------------------------------------------------------------
// stats: reafișează un raport existent
// ---------------------------------------------------------------------------
fn run_stats(args: StatsArgs, config: Config) -> Result<()> {
    let path = args.report.unwrap_or(config.report.path);
    let rows = report::read_report(&path)
        .context("Execută mai întâi analiza (subcomanda 'analyze')")?;

    display::log_info(&format!("Statisticile raportului '{}'", path.display()));
    display::print_report_table(&rows);
    display::print_summary(&report::summarize(&rows));
    Ok(())
}

// ---------------------------------------------------------------------------
// demo: scrie trafic de exemplu, apoi îl analizează ca pe orice fișier
// ---------------------------------------------------------------------------
fn run_demo(args: DemoArgs, mut config: Config) -> Result<()> {
    args.detection.apply(&mut config);
    config.validate()?;

    let written = sample::write_sample(&args.sample).with_context(|| {
        format!("Nu s-a putut scrie traficul de exemplu în '{}'", args.sample.display())
    })?;
    display::log_info(&format!(
        "{} linii de exemplu scrise în '{}'",
        written,
        args.sample.display()
    ));

    let parser = parser::create_parser(&config.input.format);
    log_settings(parser.as_ref(), &config);

    let analysis = analyze_path(&args.sample, parser.as_ref(), &config.detection)
        .context("Analiza traficului de exemplu a eșuat")?;
    finish_analysis(&analysis, &config)
}

// ---------------------------------------------------------------------------
// listen: bucla UDP principală
//
// Fiecare datagramă e procesată într-un task separat dintr-un `JoinSet`;
// starea e un `SharedState` (DashMap) clonat ieftin în fiecare task.
// Raportul se rescrie la fiecare tick și o ultimă dată la Ctrl-C, după
// ce toate task-urile în lucru s-au terminat.
// ---------------------------------------------------------------------------
async fn run_listen(args: ListenArgs, mut config: Config) -> Result<()> {
    args.detection.apply(&mut config);
    if let Some(bind) = args.bind_address {
        config.listener.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.listener.port = port;
    }
    config.validate()?;

    let parser: Arc<dyn LineParser> = Arc::from(parser::create_parser(&config.input.format));
    log_settings(parser.as_ref(), &config);

    let state = SharedState::new();
    let config = Arc::new(config);

    let bind_addr = config.listener_addr();
    let socket = UdpSocket::bind(&bind_addr)
        .await
        .with_context(|| format!("Nu s-a putut lega socket UDP pe {}", bind_addr))?;

    display::log_info(&format!(
        "Ascult pe UDP {} | raport la fiecare {}s în '{}'",
        bind_addr,
        config.listener.flush_interval_secs,
        config.report.path.display()
    ));
    display::print_separator();

    let mut flush = tokio::time::interval(Duration::from_secs(config.listener.flush_interval_secs));
    // Primul tick e imediat; nu scriem un raport gol la pornire
    flush.tick().await;

    // Buffer pentru datele UDP (64KB - dimensiunea maximă a unui pachet UDP)
    let mut buf = vec![0u8; 65535];

    // Task-urile de procesare încă în lucru
    let mut in_flight: JoinSet<()> = JoinSet::new();

    loop {
        tokio::select! {
            received = socket.recv_from(&mut buf) => {
                let (len, _src_addr) = received.context("Eroare la recv_from UDP")?;
                let raw_data = String::from_utf8_lossy(&buf[..len]).to_string();

                let parser = Arc::clone(&parser);
                let state = state.clone();
                let show_flows = args.show_flows;

                in_flight.spawn(async move {
                    process_datagram(&raw_data, parser.as_ref(), &state, show_flows);
                });
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    display::log_error(&format!("Task de procesare eșuat: {}", e));
                }
            }
            _ = flush.tick() => {
                flush_report(&state, &config);
            }
            _ = tokio::signal::ctrl_c() => {
                display::log_info("Oprire cerută (Ctrl-C), scriu raportul final ...");
                // Datagramele deja primite intră în raportul final
                drain_in_flight(&mut in_flight).await;
                flush_report(&state, &config);
                break;
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// O datagramă poate conține mai multe linii concatenate ("buffer
// coalescing"); liniile goale dintre ele nu sunt numărate.
// ---------------------------------------------------------------------------
fn process_datagram(raw_data: &str, parser: &dyn LineParser, state: &SharedState, show_flows: bool) {
    for line in raw_data.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(event) = state.ingest_line(parser, line) {
            if show_flows {
                display::log_flow_event(&event);
            }
        }
    }
}

/// Așteaptă toate task-urile de procesare rămase.
async fn drain_in_flight(in_flight: &mut JoinSet<()>) {
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            display::log_error(&format!("Task de procesare eșuat: {}", e));
        }
    }
}

// ---------------------------------------------------------------------------
// Un IP e anunțat o singură dată, la prima evaluare care îl găsește scan;
// raportul CSV îl marchează în continuare "Sim".
// ---------------------------------------------------------------------------
fn flush_report(state: &SharedState, config: &Config) {
    let flush = state.flush(&config.detection);
    let analysis = &flush.analysis;

    for verdict in &flush.new_alerts {
        display::log_scan_alert(verdict, config.detection.window_secs);
    }
    display::print_summary(&analysis.summary());

    match report::write_report(&config.report.path, &analysis.rows) {
        Ok(()) => display::log_info(&format!(
            "Raport actualizat: {} ({} IP-uri, {} linii ignorate)",
            config.report.path.display(),
            state.ip_count(),
            analysis.aggregation.unparsed
        )),
        // Non-fatal în modul live: încercăm din nou la următorul tick
        Err(e) => display::log_error(&format!("{:#}", anyhow::Error::from(e))),
    }
}
