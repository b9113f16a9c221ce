// ============================================================
//  display.rs - Output vizual în consolă
// ============================================================
//
//  Concepte Rust demonstrate aici:
//  - Funcții libere (nu sunt metode ale unui struct)
//  - Trăsătura `Colorize` din crate-ul `colored`
//  - `&str` vs `String`: funcțiile primesc împrumuturi
// ============================================================

use crate::aggregator::Aggregation;
use crate::detector::ScanVerdict;
use crate::parser::FlowEvent;
use crate::report::{ReportRow, ReportSummary};
use chrono::Local;
use colored::Colorize;

// Lățimea separatorului orizontal (în caractere)
const SEPARATOR_WIDTH: usize = 70;

pub fn print_banner() {
    let border = "═".repeat(SEPARATOR_WIDTH - 2);
    println!();
    println!("{}", format!("╔{}╗", border).bold().cyan());
    println!(
        "{}",
        format!(
            "║{:^width$}║",
            "ANALIZOR DE TRAFIC  v0.1.0",
            width = SEPARATOR_WIDTH - 2
        )
        .bold()
        .cyan()
    );
    println!(
        "{}",
        format!(
            "║{:^width$}║",
            "Detecție Port Scan  |  tcpdump / tabel conexiuni",
            width = SEPARATOR_WIDTH - 2
        )
        .cyan()
    );
    println!("{}", format!("╚{}╝", border).bold().cyan());
    println!();
}

/// Linie separatoare orizontală pentru lizibilitate vizuală
pub fn print_separator() {
    let line = "─".repeat(SEPARATOR_WIDTH);
    println!("{}", line.dimmed());
}

/// Mesaj informațional - verde, pentru operații normale
pub fn log_info(msg: &str) {
    let ts = timestamp();
    println!(
        "{} {} {}",
        ts.bold().white(),
        " INFO ".on_green().black().bold(),
        msg.white()
    );
}

/// Avertisment - galben, pentru situații care merită atenție
pub fn log_warn(msg: &str) {
    let ts = timestamp();
    println!(
        "{} {} {}",
        ts.bold().white(),
        " WARN ".on_yellow().black().bold(),
        msg.yellow()
    );
}

/// Eroare - roșu aprins; merge pe stderr
pub fn log_error(msg: &str) {
    let ts = timestamp();
    eprintln!(
        "{} {} {}",
        ts.bold().white(),
        " ERR  ".on_red().white().bold(),
        msg.red()
    );
}

/// Un flux parsat în modul live
pub fn log_flow_event(event: &FlowEvent) {
    let ts = timestamp();
    println!(
        "{} {} [{:>12.6}] Src={} DstPort={}",
        ts.dimmed(),
        "[FLOW]".blue(),
        event.timestamp,
        event.source_ip.bright_blue(),
        format!("{}", event.dest_port).bright_blue()
    );
}

/// Alertă Port Scan - fundal roșu, imposibil de ratat
pub fn log_scan_alert(verdict: &ScanVerdict, window_secs: f64) {
    let ts = timestamp();
    let separator = "▶".repeat(3);

    println!("{}", "─".repeat(SEPARATOR_WIDTH).red());
    println!(
        "{} {} {} [PORT SCAN] {} | {} porturi distincte in {}s",
        ts.bold().white(),
        separator.red().bold(),
        " ALERT ".on_red().white().bold(),
        format!("[IP: {}]", verdict.source_ip).red().bold(),
        format!("{}", verdict.peak_ports).red().bold(),
        window_secs
    );
    println!("{}", "─".repeat(SEPARATOR_WIDTH).red());
}

// ---------------------------------------------------------------------------
// Statisticile de parsare. Dacă nu s-a recunoscut niciun IP, arătăm
// primele linii neparsate: de obicei formatul de intrare e greșit.
// ---------------------------------------------------------------------------
pub fn print_parse_stats(aggregation: &Aggregation) {
    println!("{}", "Statistici analiză:".bold());
    println!("   • Total linii citite:       {}", aggregation.lines_seen);
    println!("   • Linii parsate cu succes:  {}", aggregation.parsed());
    println!("   • Linii ignorate:           {}", aggregation.unparsed);
    println!("   • IP-uri unice detectate:   {}", aggregation.unique_ips());

    if aggregation.per_ip.is_empty() && aggregation.lines_seen > 0 {
        log_warn("NICIUN IP detectat - verificați formatul de intrare!");
        for (i, line) in aggregation.unparsed_samples.iter().enumerate() {
            println!("      Exemplu linie {}: {}", i + 1, line.dimmed());
        }
    }
}

pub fn print_report_table(rows: &[ReportRow]) {
    print_separator();
    for row in rows {
        let status = if row.is_scan {
            "SIM".on_red().white().bold()
        } else {
            "Nu".green()
        };
        println!(
            "IP: {:<15} | Evenimente: {:<6} | PortScan: {}",
            row.source_ip, row.total_events, status
        );
    }
    print_separator();
}

pub fn print_summary(summary: &ReportSummary) {
    println!("{}", "Rezumat:".bold());
    println!("   • Total IP-uri unice:             {}", summary.total_ips);
    println!("   • IP-uri cu comportament normal:  {}", summary.normal);
    println!(
        "   • IP-uri cu posibil port scan:    {}",
        if summary.scans > 0 {
            format!("{}", summary.scans).red().bold()
        } else {
            format!("{}", summary.scans).green()
        }
    );
}

fn timestamp() -> String {
    Local::now().format("[%Y-%m-%d %H:%M:%S]").to_string()
}
