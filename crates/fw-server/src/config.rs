use std::env;
use std::path::PathBuf;
use std::time::Duration;

use filewhisperer_engine::{BatchConfig, FlavorPoolConfig};

/// Server configuration, sourced entirely from the environment at startup.
/// There is no on-disk config file: every value here is named by an
/// environment variable, so there is nothing to (de)serialize.
#[derive(Debug, Clone)]
pub struct Config {
    pub output_dir: PathBuf,
    pub debug_backup_dir: Option<PathBuf>,
    pub grpc_max_workers: usize,
    pub metrics_port: u16,
    pub tree_pool_size: usize,
    pub tree_pool_acquire_timeout: Duration,
    pub batch: BatchConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} could not be parsed: {1}")]
    Invalid(&'static str, String),
}

/// Interprets `GRPC_MAX_WORKERS`/`TREE_POOL_SIZE`'s shared convention:
/// negative → `cpu_count * |v|`, `0 < v < 1` → `cpu_count * v`, `v >= 1` →
/// exact count, `0` → 1. The result is never below 1.
fn worker_count(name: &'static str, default: f64) -> Result<usize, ConfigError> {
    let raw = match env::var(name) {
        Ok(value) => value,
        Err(_) => return Ok(scale_workers(default)),
    };
    let value: f64 = raw
        .parse()
        .map_err(|_| ConfigError::Invalid(name, raw.clone()))?;
    Ok(scale_workers(value))
}

fn scale_workers(value: f64) -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get() as f64)
        .unwrap_or(1.0);
    let count = if value < 0.0 {
        cpus * value.abs()
    } else if value == 0.0 {
        1.0
    } else if value < 1.0 {
        cpus * value
    } else {
        value
    };
    (count.round() as usize).max(1)
}

fn bool_env(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

fn usize_env(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let output_dir = env::var("FILE_WHISPERER_OUTPUT_DIR")
            .map_err(|_| ConfigError::Missing("FILE_WHISPERER_OUTPUT_DIR"))?
            .into();

        let debug_backup_dir = env::var("FILE_WHISPERER_DEBUG_BACKUP_DIR").ok().map(PathBuf::from);

        let grpc_max_workers = worker_count("GRPC_MAX_WORKERS", 1.0)?;
        let metrics_port = usize_env("FILE_WHISPERER_METRICS_PORT", 9090) as u16;
        let tree_pool_size = worker_count("TREE_POOL_SIZE", 1.0)?;

        let timeout_secs = usize_env("TREE_POOL_ACQUIRE_TIMEOUT", 3);

        let batch = BatchConfig {
            ocr: FlavorPoolConfig {
                enabled: bool_env("FILEWHISPERER_OCR_POOL_ENABLED", false),
                workers: usize_env("FILEWHISPERER_OCR_POOL_WORKERS", 2),
            },
            word: FlavorPoolConfig {
                enabled: bool_env("FILEWHISPERER_WORD_POOL_ENABLED", false),
                workers: usize_env("FILEWHISPERER_WORD_POOL_WORKERS", 2),
            },
            pdf: FlavorPoolConfig {
                enabled: bool_env("FILEWHISPERER_PDF_POOL_ENABLED", false),
                workers: usize_env("FILEWHISPERER_PDF_POOL_WORKERS", 2),
            },
        };

        Ok(Self {
            output_dir,
            debug_backup_dir,
            grpc_max_workers,
            metrics_port,
            tree_pool_size,
            tree_pool_acquire_timeout: Duration::from_secs(timeout_secs as u64),
            batch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_workers_matches_the_documented_rules() {
        assert_eq!(scale_workers(0.0), 1);
        assert!(scale_workers(4.0) == 4);
    }
}
