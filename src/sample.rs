// ============================================================
//  sample.rs - Trafic de exemplu pentru demonstrații
// ============================================================
//
//  Trei surse, în formatul tabelului de conexiuni:
//    192.168.1.100 - 5 conexiuni normale (porturi 80..84, la 1s)
//    10.0.0.15     - port scan: 15 porturi (1000..1014), la 2s
//    192.168.1.102 - 3 conexiuni HTTPS, la 10s
// ============================================================

use std::fs;
use std::io;
use std::path::Path;

pub fn sample_traffic() -> Vec<String> {
    let mut lines = vec!["# Timestamp IP_Origem Porta_Destino IP_Destino PID".to_string()];

    lines.extend((0..5).map(|i| {
        format!("{:.3} 192.168.1.100:0 > 8.8.8.8:{} PID:1234", i as f64, 80 + i)
    }));
    lines.extend((0..15).map(|i| {
        format!("{:.3} 10.0.0.15:0 > 192.168.1.1:{} PID:5678", i as f64 * 2.0, 1000 + i)
    }));
    lines.extend((0..3).map(|i| {
        format!("{:.3} 192.168.1.102:0 > 1.1.1.1:443 PID:9012", i as f64 * 10.0)
    }));

    lines
}

pub fn write_sample(path: &Path) -> io::Result<usize> {
    let lines = sample_traffic();
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content)?;
    Ok(lines.len())
}
