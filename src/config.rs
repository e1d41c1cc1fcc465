use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;
use tracing::info;

use crate::error::WifiError;
use crate::log::DEFAULT_LOG_CAPACITY;
use crate::network::types::NetworkCredential;

// ─── Embedded Default ────────────────────────────────────────────────────
const DEFAULT_CONFIG_TOML: &str = include_str!("../default_config.toml");

// ─── CLI Arguments (override layer) ─────────────────────────────────────
/// wifi-connect: join a WiFi network by hand or from a preset
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "wifi-connect", version, about, long_about = None)]
pub struct CliArgs {
    /// WiFi interface to use (overrides config file)
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Log level filter (overrides config file)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Write tracing output to this file (overrides config file)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Path to a custom config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// UI tick interval in milliseconds (overrides config file)
    #[arg(short, long)]
    pub tick_rate: Option<u64>,

    /// Print the default config to stdout and exit
    #[arg(long)]
    pub print_default_config: bool,
}

// ─── TOML Structs ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub presets: PresetTable,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// WiFi interface (empty string = auto-detect)
    pub interface: String,
    pub log_level: String,
    /// Tracing output file (empty string = disabled)
    pub log_file: String,
    pub log_capacity: usize,
    pub tick_rate_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            interface: String::new(),
            log_level: "info".into(),
            log_file: String::new(),
            log_capacity: DEFAULT_LOG_CAPACITY,
            tick_rate_ms: 250,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        // Parse the embedded TOML; this cannot fail since we control it
        toml::from_str(DEFAULT_CONFIG_TOML)
            .expect("BUG: embedded default_config.toml is invalid TOML")
    }
}

// ─── Preset Table ───────────────────────────────────────────────────────

/// Preset networks, keyed by SSID and iterated in SSID order.
/// Every entry is a validated credential.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>")]
pub struct PresetTable {
    entries: BTreeMap<String, NetworkCredential>,
}

impl PresetTable {
    pub fn from_pairs<I, S, P>(pairs: I) -> Result<Self, WifiError>
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: Into<String>,
    {
        let mut entries = BTreeMap::new();
        for (ssid, passphrase) in pairs {
            let credential = NetworkCredential::new(ssid, passphrase)?;
            entries.insert(credential.ssid().to_string(), credential);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, ssid: &str) -> Option<&NetworkCredential> {
        self.entries.get(ssid)
    }

    /// Preset SSIDs in button order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl TryFrom<BTreeMap<String, String>> for PresetTable {
    type Error = WifiError;

    fn try_from(map: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_pairs(map)
    }
}

// ─── Path Resolution ────────────────────────────────────────────────────

impl Config {
    /// Standard config file path: ~/.config/wifi-connect/config.toml
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wifi-connect")
            .join("config.toml")
    }

    /// Convenience: interface as Option<&str> (empty = None)
    pub fn interface(&self) -> Option<&str> {
        let iface = self.general.interface.trim();
        if iface.is_empty() { None } else { Some(iface) }
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        let path = self.general.log_file.trim();
        if path.is_empty() { None } else { Some(PathBuf::from(path)) }
    }

    pub fn tick_rate(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.general.tick_rate_ms.max(10))
    }
}

// ─── Bootloader ─────────────────────────────────────────────────────────

/// Load configuration: resolve the file (writing defaults if missing),
/// parse it, then apply CLI overrides.
pub fn load(cli: &CliArgs) -> Result<Config> {
    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);

    if !config_path.exists() {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).wrap_err_with(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&config_path, DEFAULT_CONFIG_TOML).wrap_err_with(|| {
            format!(
                "Failed to write default config to {}",
                config_path.display()
            )
        })?;
        info!("Created default config at {}", config_path.display());
    }

    let toml_str = std::fs::read_to_string(&config_path)
        .wrap_err_with(|| format!("Failed to read config from {}", config_path.display()))?;

    let mut config = parse(&toml_str).wrap_err_with(|| {
        format!(
            "Failed to parse config at {}.\n\
             Delete the file to regenerate defaults, or run:\n  \
             wifi-connect --print-default-config > {:?}",
            config_path.display(),
            config_path
        )
    })?;

    // ── CLI overrides ───────────────────────────────────────────────
    if let Some(ref iface) = cli.interface {
        config.general.interface = iface.clone();
    }
    if let Some(ref level) = cli.log_level {
        config.general.log_level = level.clone();
    }
    if let Some(ref path) = cli.log_file {
        config.general.log_file = path.display().to_string();
    }
    if let Some(ms) = cli.tick_rate {
        config.general.tick_rate_ms = ms;
    }

    Ok(config)
}

fn parse(toml_str: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns the embedded default config TOML string.
pub fn default_config_toml() -> &'static str {
    DEFAULT_CONFIG_TOML
}
