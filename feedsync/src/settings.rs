use std::{
    env,
    path::{Path, PathBuf},
};

use config::{Config, File};
use log::debug;
use serde::Deserialize;

use crate::cli::Args;
use crate::mutator::LikeMode;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub like_mode: Option<LikeMode>,
    pub timeout_secs: Option<u64>,
}

const CONFIG_FILE_NAME: &str = env!("CARGO_PKG_NAME");

fn get_xdg_config_path() -> Option<PathBuf> {
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config));
    }

    if let Ok(home) = env::var("HOME") {
        return Some(PathBuf::from(home).join(".config"));
    }

    None
}

pub fn config_file_path() -> Option<PathBuf> {
    get_xdg_config_path().map(|dir| dir.join(CONFIG_FILE_NAME).join("config.toml"))
}

pub fn load_settings_from(config_path: &Path) -> anyhow::Result<Settings> {
    if !config_path.exists() {
        return Ok(Settings::default());
    }

    Config::builder()
        .add_source(File::from(config_path).required(false))
        .build()?
        .try_deserialize()
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to deserialize config file {}: {}",
                config_path.display(),
                e
            )
        })
}

pub fn load_settings() -> anyhow::Result<Settings> {
    match config_file_path() {
        Some(config_path) => load_settings_from(&config_path),
        None => Ok(Settings::default()),
    }
}

/// Fill options not given on the command line (or through the environment)
/// from the config file.
pub fn merge_settings_with_args(args: &Args, settings: Settings) -> Args {
    let mut new_args = args.clone();

    macro_rules! apply_if_none {
        ($args:expr, $field:ident, $settings:expr) => {
            if $args.$field.is_none() {
                $args.$field = $settings.$field;
            }
        };
    }

    apply_if_none!(new_args, api_url, settings);
    apply_if_none!(new_args, token, settings);
    apply_if_none!(new_args, like_mode, settings);
    apply_if_none!(new_args, timeout_secs, settings);

    debug!(
        "merged config: api_url={:?} like_mode={:?} timeout_secs={:?}",
        new_args.api_url, new_args.like_mode, new_args.timeout_secs
    );

    new_args
}
