// ============================================================
//  config.rs - Structurile de configurare și încărcarea TOML
// ============================================================
//
//  Concepte Rust demonstrate aici:
//  - #[derive(...)] : generare automată de implementări de trait-uri
//  - serde::Deserialize + #[serde(default)] : orice câmp lipsă din
//    fișier primește valoarea implicită
//  - anyhow::Result : un Result cu tipul de eroare dinamic
// ============================================================

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Fișierul căutat în directorul curent când nu se dă `--config`.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

// ---------------------------------------------------------------------------
// Structura principală de configurare
//
// `#[serde(default)]` pe structură: o secțiune lipsă (ex: [listener])
// este completată din `Default`. Un config.toml gol este valid.
// ---------------------------------------------------------------------------
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub input:     InputConfig,
    pub detection: DetectionConfig,
    pub report:    ReportConfig,
    pub listener:  ListenerConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Fișierul text de trafic; "-" înseamnă stdin
    pub path: PathBuf,

    /// Formatul liniilor: "auto", "tcpdump" sau "conexoes"
    pub format: String,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    /// Fereastra glisantă, în secunde
    pub window_secs: f64,

    /// Pragul de porturi distincte; alerta la `> port_threshold`
    pub port_threshold: usize,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Unde se scrie raportul CSV
    pub path: PathBuf,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Adresa IP pe care ascultă listener-ul (ex: "0.0.0.0")
    pub bind_address: String,

    /// Portul UDP pe care sosesc liniile de trafic
    pub port: u16,

    /// Cât de des (în secunde) se rescrie raportul în modul live
    pub flush_interval_secs: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            path:   PathBuf::from("trafego.txt"),
            format: "auto".to_string(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionConfig {
            window_secs:    60.0,
            port_threshold: 10,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            path: PathBuf::from("relatorio.csv"),
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        ListenerConfig {
            bind_address:        "0.0.0.0".to_string(),
            port:                5555,
            flush_interval_secs: 30,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| {
            format!("Nu s-a putut citi fișierul de configurare: '{}'", path.display())
        })?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Eroare la parsarea TOML din '{}'", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    // -----------------------------------------------------------------------
    // Un `--config` explicit trebuie să existe; altfel folosim config.toml
    // din directorul curent dacă există, iar în lipsa lui valorile implicite.
    // -----------------------------------------------------------------------
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    /// Verifică valorile care ar face analiza sau listener-ul să nu aibă sens.
    pub fn validate(&self) -> Result<()> {
        if !self.detection.window_secs.is_finite() || self.detection.window_secs < 0.0 {
            bail!(
                "detection.window_secs trebuie să fie un număr finit >= 0 (primit {})",
                self.detection.window_secs
            );
        }
        if self.listener.flush_interval_secs == 0 {
            bail!("listener.flush_interval_secs trebuie să fie > 0");
        }
        Ok(())
    }

    /// Returnează adresa completă a listener-ului UDP (ex: "0.0.0.0:5555")
    pub fn listener_addr(&self) -> String {
        format!("{}:{}", self.listener.bind_address, self.listener.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml_str("").expect("parse");
        assert_eq!(config, Config::default());
        assert_eq!(config.detection.window_secs, 60.0);
        assert_eq!(config.detection.port_threshold, 10);
        assert_eq!(config.report.path, PathBuf::from("relatorio.csv"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [detection]
            port_threshold = 20

            [listener]
            port = 6000
            "#,
        )
        .expect("parse");

        assert_eq!(config.detection.port_threshold, 20);
        assert_eq!(config.detection.window_secs, 60.0);
        assert_eq!(config.listener_addr(), "0.0.0.0:6000");
        assert_eq!(config.input.format, "auto");
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(Config::from_toml_str("[detection]\nport_threshold = \"zece\"").is_err());
    }

    #[test]
    fn validate_rejects_nonsense() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.detection.window_secs = -1.0;
        assert!(config.validate().is_err());

        config.detection.window_secs = 60.0;
        config.listener.flush_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let missing = Path::new("/nonexistent/scan-analyzer/config.toml");
        assert!(Config::load_or_default(Some(missing)).is_err());
    }
}
