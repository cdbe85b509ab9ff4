//! Run configuration.
//!
//! Credentials come from the environment, optionally seeded from a `.env`
//! file in the working directory. A missing token or file id is the one
//! failure that aborts the whole run up front.

use std::path::PathBuf;

use tokio::fs;
use tracing::debug;

use crate::error::{BuildError, Result};

pub const BLUEPRINTS_DIR: &str = "src/blueprints";

#[derive(Debug, Clone)]
pub struct FigmaConfig {
    pub token: String,
    pub fig_file: String,
    /// Blueprint root, `src/blueprints` under the project.
    pub src_path: PathBuf,
}

/// Seed the process environment from `.env` (KEY=VALUE lines). Existing
/// variables win over file entries.
pub async fn load_env_file() {
    let Ok(raw) = fs::read_to_string(".env").await else {
        return;
    };
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if std::env::var_os(key).is_none() {
            debug!("env {key} loaded from .env");
            std::env::set_var(key, value.trim().trim_matches('"').trim_matches('\''));
        }
    }
}

/// Resolve the design-import configuration, failing fast on missing
/// credentials.
pub async fn figma_config() -> Result<FigmaConfig> {
    load_env_file().await;
    let token = std::env::var("FIGMA_TOKEN")
        .map_err(|_| BuildError::Config("FIGMA_TOKEN is not set".to_string()))?;
    let fig_file = std::env::var("FIGMA_FILE")
        .map_err(|_| BuildError::Config("FIGMA_FILE is not set".to_string()))?;
    Ok(FigmaConfig {
        token,
        fig_file,
        src_path: std::env::current_dir()
            .map_err(|e| BuildError::io(".", e))?
            .join(BLUEPRINTS_DIR),
    })
}
