//! Configuration loading and store factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use vettest_core::sampling::SamplingPlan;
use vettest_core::traits::ResultStore;
use vettest_core::ApprovalPolicy;

use crate::file::FileStore;
use crate::memory::MemoryStore;

/// Where evaluation records are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// One JSON file per record in `dir`.
    File {
        #[serde(default = "default_store_dir")]
        dir: PathBuf,
    },
    /// Records live only as long as the process.
    Memory,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            dir: default_store_dir(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("./vettest-results")
}

/// Top-level vettest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VettestConfig {
    /// Pass/fail thresholds.
    #[serde(default)]
    pub policy: ApprovalPolicy,
    /// Question sampling defaults.
    #[serde(default)]
    pub sampling: SamplingPlan,
    /// Persistence backend.
    #[serde(default)]
    pub store: StoreConfig,
    /// Max retries on transient store errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    500
}

impl Default for VettestConfig {
    fn default() -> Self {
        Self {
            policy: ApprovalPolicy::default(),
            sampling: SamplingPlan::default(),
            store: StoreConfig::default(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables resolve to the empty string.
fn resolve_env_vars(s: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = lookup(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
        from = start + value.len();
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `vettest.toml` in the current directory
/// 2. `~/.config/vettest/config.toml`
///
/// Environment variable overrides: `VETTEST_APPROVAL_MIN`,
/// `VETTEST_APPROVAL_MAX`, `VETTEST_MAX_TRAP_ERRORS`, `VETTEST_STORE_DIR`.
pub fn load_config() -> Result<VettestConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<VettestConfig> {
    let env = |name: &str| std::env::var(name).ok();
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("vettest.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content, env)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => VettestConfig::default(),
    };

    apply_env_overrides(&mut config, env)?;

    config
        .policy
        .validate()
        .context("invalid approval policy")?;

    tracing::debug!(
        path = ?config_path,
        approval_min = config.policy.approval_min,
        approval_max = config.policy.approval_max,
        max_trap_errors = config.policy.max_trap_errors,
        "loaded configuration"
    );

    Ok(config)
}

/// Parse TOML and resolve `${VAR}` references in string values.
fn parse_config_str(
    content: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<VettestConfig> {
    let mut config: VettestConfig = toml::from_str(content)?;
    if let StoreConfig::File { dir } = &mut config.store {
        *dir = PathBuf::from(resolve_env_vars(&dir.to_string_lossy(), lookup));
    }
    Ok(config)
}

fn apply_env_overrides(
    config: &mut VettestConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    let number = |name: &str| -> Result<Option<u32>> {
        lookup(name)
            .map(|v| {
                v.trim()
                    .parse::<u32>()
                    .with_context(|| format!("{name} must be a non-negative integer, got '{v}'"))
            })
            .transpose()
    };

    if let Some(v) = number("VETTEST_APPROVAL_MIN")? {
        config.policy.approval_min = v;
    }
    if let Some(v) = number("VETTEST_APPROVAL_MAX")? {
        config.policy.approval_max = v;
    }
    if let Some(v) = number("VETTEST_MAX_TRAP_ERRORS")? {
        config.policy.max_trap_errors = v;
    }
    if let Some(dir) = lookup("VETTEST_STORE_DIR") {
        config.store = StoreConfig::File {
            dir: PathBuf::from(dir),
        };
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("vettest"))
}

/// Create a store instance from its configuration.
pub fn create_store(config: &StoreConfig) -> Box<dyn ResultStore> {
    match config {
        StoreConfig::File { dir } => Box::new(FileStore::new(dir)),
        StoreConfig::Memory => Box::new(MemoryStore::new()),
    }
}
