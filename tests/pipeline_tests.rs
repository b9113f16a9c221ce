use scan_analyzer::aggregator::aggregate;
use scan_analyzer::analysis::{analyze_lines, analyze_path, Analysis};
use scan_analyzer::config::DetectionConfig;
use scan_analyzer::detector::{detect, detect_all};
use scan_analyzer::error::AnalysisError;
use scan_analyzer::parser::FormatChain;
use scan_analyzer::report::{self, write_report};
use std::path::Path;

fn tcpdump_line(t: f64, src: &str, port: u16) -> String {
    format!("{:.6} IP {}.40000 > 10.0.0.1.{}: Flags [S], seq 0, length 0", t, src, port)
}

fn run(lines: &[String]) -> Analysis {
    analyze_lines(lines, &FormatChain::standard(), &DetectionConfig::default())
}

// Trafic mixt: un scanner, doi clienți normali, un IP care lovește un singur
// port, câteva linii stricate și formate amestecate.
fn mixed_traffic() -> Vec<String> {
    let mut lines = Vec::new();
    for i in 0..15u16 {
        lines.push(tcpdump_line(i as f64 * 2.0, "10.0.0.15", 1000 + i));
    }
    for i in 0..5u16 {
        lines.push(format!("{}.000 192.168.1.100:0 > 8.8.8.8:{} PID:1", i, 80 + i));
    }
    for t in [0.0, 30.0, 65.0] {
        lines.push(tcpdump_line(t, "172.16.0.3", 80));
    }
    lines.push("00:01:05.000000 IP 192.168.1.102.5000 > 1.1.1.1.https: Flags [S]".to_string());
    lines.push("reading from file captura.pcap, link-type EN10MB (Ethernet)".to_string());
    lines.push(String::new());
    lines.push("0.5 IP6 fe80::1.546 > ff02::1:2.547: dhcp6".to_string());
    lines
}

#[test]
fn scenario_1_few_ports_is_not_a_scan() {
    let lines: Vec<String> = (0..5u16)
        .map(|i| tcpdump_line(i as f64 * 2.0, "192.168.1.100", 20 + i))
        .collect();
    let analysis = run(&lines);

    assert_eq!(analysis.rows.len(), 1);
    assert_eq!(analysis.rows[0].total_events, 5);
    assert!(!analysis.rows[0].is_scan);
}

#[test]
fn scenario_2_fifteen_ports_two_seconds_apart_is_a_scan() {
    let lines: Vec<String> = (0..15u16)
        .map(|i| tcpdump_line(i as f64 * 2.0, "10.0.0.15", 1000 + i))
        .collect();
    let analysis = run(&lines);

    assert_eq!(analysis.rows[0].total_events, 15);
    assert!(analysis.rows[0].is_scan);
    assert!(analysis.verdicts["10.0.0.15"].is_scan);
}

#[test]
fn scenario_3_same_port_across_window_boundary() {
    let lines: Vec<String> = [0.0, 30.0, 65.0]
        .iter()
        .map(|&t| tcpdump_line(t, "172.16.0.3", 80))
        .collect();
    let analysis = run(&lines);

    assert_eq!(analysis.rows[0].total_events, 3);
    assert!(!analysis.rows[0].is_scan);
    assert_eq!(analysis.verdicts["172.16.0.3"].peak_ports, 1);
}

#[test]
fn scenario_4_malformed_lines_are_counted_not_recorded() {
    let lines = vec![
        tcpdump_line(1.0, "10.0.0.1", 22),
        "garbage".to_string(),
        tcpdump_line(2.0, "10.0.0.1", 80),
        "1.0 IP 10.0.0.1 > nowhere".to_string(),
        tcpdump_line(3.0, "10.0.0.2", 443),
    ];
    let analysis = run(&lines);

    assert_eq!(analysis.aggregation.unparsed, 2);
    assert_eq!(analysis.aggregation.per_ip["10.0.0.1"].total_events, 2);
    assert_eq!(analysis.aggregation.per_ip["10.0.0.2"].total_events, 1);
    assert_eq!(analysis.rows.iter().map(|r| r.total_events).sum::<usize>(), 3);
}

#[test]
fn scenario_5_empty_input_gives_empty_report() {
    let empty: Vec<String> = Vec::new();
    let analysis = run(&empty);
    assert!(analysis.rows.is_empty());
    assert!(analysis.verdicts.is_empty());
    assert_eq!(analysis.aggregation.unparsed, 0);

    let mut out = Vec::new();
    report::write_rows(&mut out, &analysis.rows).expect("write");
    assert_eq!(String::from_utf8(out).unwrap(), "IP,Total_Eventos,Detectado_PortScan\n");
}

#[test]
fn totals_plus_unparsed_equal_line_count() {
    let lines = mixed_traffic();
    let analysis = run(&lines);
    let agg = &analysis.aggregation;

    let parsed: usize = agg.per_ip.values().map(|s| s.total_events).sum();
    assert_eq!(parsed + agg.unparsed, lines.len());
    assert_eq!(agg.lines_seen, lines.len());
    assert_eq!(agg.unparsed, 3);
}

#[test]
fn every_ip_gets_exactly_one_verdict_and_row() {
    let analysis = run(&mixed_traffic());
    let ips = analysis.aggregation.sorted_ips();

    assert_eq!(analysis.verdicts.len(), ips.len());
    assert_eq!(analysis.rows.len(), ips.len());
    for ip in ips {
        assert!(analysis.verdicts.contains_key(ip));
        assert_eq!(analysis.rows.iter().filter(|r| r.source_ip == ip).count(), 1);
    }
}

#[test]
fn input_order_does_not_change_results() {
    let lines = mixed_traffic();
    let baseline = run(&lines);

    // Permutări deterministe: inversare, rotații, pași interclasați
    let n = lines.len();
    let mut permutations: Vec<Vec<String>> = vec![lines.iter().rev().cloned().collect()];
    for k in [1, 7, 13] {
        let mut rotated = lines.clone();
        rotated.rotate_left(k % n);
        permutations.push(rotated);
    }
    for step in [2, 5] {
        // `step` e prim cu n = 27, deci i*step mod n acoperă toți indicii
        permutations.push((0..n).map(|i| lines[(i * step) % n].clone()).collect());
    }

    for shuffled in permutations {
        let analysis = run(&shuffled);
        assert_eq!(analysis.rows, baseline.rows);
        assert_eq!(analysis.verdicts, baseline.verdicts);
    }
}

#[test]
fn detection_is_idempotent_on_the_same_events() {
    let agg = aggregate(mixed_traffic(), &FormatChain::standard());
    let config = DetectionConfig::default();

    assert_eq!(detect_all(&agg.per_ip, &config), detect_all(&agg.per_ip, &config));
    for state in agg.per_ip.values() {
        assert_eq!(
            detect(&state.ordered_events, &config),
            detect(&state.ordered_events, &config)
        );
    }
}

#[test]
fn report_order_and_verdicts_for_mixed_traffic() {
    let analysis = run(&mixed_traffic());
    let got: Vec<(&str, usize, bool)> = analysis
        .rows
        .iter()
        .map(|r| (r.source_ip.as_str(), r.total_events, r.is_scan))
        .collect();

    assert_eq!(
        got,
        vec![
            ("10.0.0.15", 15, true),
            ("192.168.1.100", 5, false),
            ("172.16.0.3", 3, false),
            ("192.168.1.102", 1, false),
        ]
    );
    assert_eq!(analysis.summary().scans, 1);
}

#[test]
fn report_round_trips_through_a_file() {
    let analysis = run(&mixed_traffic());
    let path = std::env::temp_dir().join(format!("scan-analyzer-it-{}.csv", std::process::id()));

    write_report(&path, &analysis.rows).expect("write");
    let text = std::fs::read_to_string(&path).expect("read text");
    let rows = report::read_report(&path).expect("read rows");
    std::fs::remove_file(&path).ok();

    assert!(text.starts_with("IP,Total_Eventos,Detectado_PortScan\n10.0.0.15,15,Sim\n"));
    assert_eq!(rows, analysis.rows);
}

#[test]
fn sink_failure_keeps_result_in_memory() {
    let analysis = run(&mixed_traffic());
    let err = write_report(Path::new("/nonexistent-dir/x/relatorio.csv"), &analysis.rows)
        .expect_err("must fail");

    assert!(matches!(err, AnalysisError::SinkWriteFailure { .. }));
    // Rezultatul calculat este intact și poate fi scris în altă parte
    let mut out = Vec::new();
    report::write_rows(&mut out, &analysis.rows).expect("retry in memory");
    assert_eq!(analysis.rows.len(), 4);
}

#[test]
fn unreadable_source_produces_no_analysis() {
    let result = analyze_path(
        Path::new("/nonexistent-dir/x/trafego.txt"),
        &FormatChain::standard(),
        &DetectionConfig::default(),
    );
    assert!(matches!(result, Err(AnalysisError::SourceUnavailable { .. })));
}
