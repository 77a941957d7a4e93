//! Builder configuration from environment variables.

use std::path::PathBuf;

/// Paths and endpoints for one build run. Every value has an environment
/// override so deployments can relocate the data directory wholesale.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database holding the snapshot and registry artifacts.
    pub database_path: String,
    /// Root directory for caches and input drops.
    pub data_dir: PathBuf,
    /// Directory of raw custody XML documents.
    pub custody_dir: PathBuf,
    /// Directory of extracted vendor statement text files.
    pub statements_dir: PathBuf,
    /// Fund registry input (JSON).
    pub registry_file: PathBuf,
    /// Equity sector lookup table (JSON), optional.
    pub sector_table_file: PathBuf,
    /// Base URL of the regulator's bulk archive endpoint.
    pub bulk_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let data_dir = PathBuf::from(env_or("FUNDLENS_DATA_DIR", "data"));
        Self {
            database_path: std::env::var("FUNDLENS_DB_PATH")
                .unwrap_or_else(|_| data_dir.join("fundlens.db").to_string_lossy().into_owned()),
            custody_dir: path_env("FUNDLENS_CUSTODY_DIR", &data_dir, "custody"),
            statements_dir: path_env("FUNDLENS_STATEMENTS_DIR", &data_dir, "statements"),
            registry_file: path_env("FUNDLENS_REGISTRY_FILE", &data_dir, "registry.json"),
            sector_table_file: path_env("FUNDLENS_SECTOR_TABLE", &data_dir, "sectors.json"),
            bulk_base_url: env_or(
                "FUNDLENS_BULK_URL",
                "https://data.regulator.example/bulk-holdings",
            ),
            data_dir,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn path_env(key: &str, data_dir: &std::path::Path, default_name: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_dir.join(default_name))
}
