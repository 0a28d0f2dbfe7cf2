//! Run configuration: store and report locations, vocabularies, default row count.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Number of incidents generated into an empty store when no count is given.
pub const DEFAULT_ROWS: usize = 120;

/// Configuration for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite store file.
    pub db_path: PathBuf,
    /// Plain-text report file, overwritten on every run.
    pub report_path: PathBuf,
    pub vocabulary: Vocabulary,
    pub default_rows: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/incidents.db"),
            report_path: PathBuf::from("reports/report.txt"),
            vocabulary: Vocabulary::default(),
            default_rows: DEFAULT_ROWS,
        }
    }
}

impl AppConfig {
    /// Default layout relocated under `root` (`<root>/data/...`, `<root>/reports/...`).
    pub fn rooted_at(root: &Path) -> Self {
        let defaults = Self::default();
        Self {
            db_path: root.join(&defaults.db_path),
            report_path: root.join(&defaults.report_path),
            ..defaults
        }
    }
}

/// Values the seeder draws source IPs and usernames from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub source_ips: Vec<String>,
    pub usernames: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            source_ips: [
                "192.168.1.10",
                "10.0.0.5",
                "172.16.0.3",
                "8.8.8.8",
                "45.33.32.156",
                "203.0.113.25",
            ]
            .map(String::from)
            .to_vec(),
            usernames: [
                "admin",
                "jose",
                "service_account",
                "guest",
                "analyst",
                "system",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}
