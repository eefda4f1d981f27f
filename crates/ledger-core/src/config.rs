use crate::error::LedgerError;
use crate::types::LookupEntry;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application configuration, loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub lookups: LookupConfig,
    pub store: StoreConfig,
    pub stats: StatsConfig,
}

impl AppConfig {
    /// Load configuration from default path (~/.config/pachi-ledger/config.toml),
    /// falling back to defaults if the file doesn't exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.stats.offset()?;
        Ok(config)
    }

    /// Write current configuration to the default path.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pachi-ledger")
            .join("config.toml")
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Port.
    pub port: u16,
    /// Enable CORS.
    pub cors: bool,
    /// Prefix all resource routes are mounted under ("" or "/" for the root).
    pub base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            cors: true,
            base_path: "/api".into(),
        }
    }
}

/// Employee and machine master lists. Read-only at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub employees: Vec<LookupEntry>,
    pub machines: Vec<LookupEntry>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        let employees = ["田中太郎", "佐藤次郎", "鈴木三郎", "高橋四郎", "伊藤五郎"];
        let machines = [
            "北斗の拳",
            "バジリスク",
            "マイジャグラー",
            "アイムジャグラー",
            "ハナハナ",
            "吉宗",
            "モンスターハンター",
            "ゴッドイーター",
        ];
        Self {
            employees: numbered(&employees),
            machines: numbered(&machines),
        }
    }
}

fn numbered(names: &[&str]) -> Vec<LookupEntry> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| LookupEntry::new((i + 1).to_string(), *name))
        .collect()
}

/// Session store seeding. The store itself is process-local and never
/// written back to disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Start with the built-in sample sessions.
    pub demo_data: bool,
    /// JSON array of sessions loaded at startup.
    pub seed_file: Option<PathBuf>,
}

/// Statistics settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Offset from UTC used to derive calendar days and months.
    pub utc_offset_hours: i32,
    /// Display name for ids missing from the lookup lists.
    pub unknown_label: String,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: 0,
            unknown_label: "unknown".into(),
        }
    }
}

impl StatsConfig {
    pub fn offset(&self) -> Result<FixedOffset, LedgerError> {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                LedgerError::Config(format!(
                    "utc_offset_hours out of range: {}",
                    self.utc_offset_hours
                ))
            })
    }
}
