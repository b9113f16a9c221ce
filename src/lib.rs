//! Analizor de trafic: parsează linii text (tcpdump / tabel de conexiuni),
//! le grupează pe IP sursă și marchează IP-urile care ating prea multe
//! porturi distincte într-o fereastră glisantă.
pub mod aggregator;
pub mod analysis;
pub mod config;
pub mod detector;
pub mod display;
pub mod error;
pub mod parser;
pub mod report;
pub mod sample;
pub mod state;
