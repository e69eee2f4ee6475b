use crate::models::Deployment;
use anyhow::{bail, Context, Result};
use dirs::config_dir;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

pub const APP_DIR_NAME: &str = "application-ai";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_DEPLOYMENT: &str = "text-davinci-003";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const CHOICES: u8 = 1;

/// Optional settings read from `<config_dir>/application-ai/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub deployment: Option<String>,
    pub max_tokens: Option<u32>,
    pub azure_endpoint: Option<String>,
    pub skip_confirmation: Option<bool>,
    pub temperature: Option<f32>,
    pub chat_context: Option<String>,
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub deployment: Option<String>,
    pub max_tokens: Option<u32>,
    pub azure_endpoint: Option<String>,
    /// `Some(false)` turns off a `skip_confirmation = true` from the file.
    pub skip_confirmation: Option<bool>,
    pub temperature: Option<f32>,
    pub chat_context: Option<String>,
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_key: String,
    pub deployment: Deployment,
    /// `None` means the deployment's own context window.
    pub max_tokens: Option<u32>,
    pub azure_endpoint: Option<String>,
    pub skip_confirmation: bool,
    pub temperature: f32,
    pub chat_context: String,
    pub api_base: String,
    pub timeout_secs: u64,
    pub choices: u8,
}

pub fn default_config_path() -> Result<PathBuf> {
    let base = config_dir().context("unable to resolve OS config directory")?;
    Ok(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

pub fn load_config_if_exists(path: &PathBuf) -> Result<Option<FileConfig>> {
    if path.exists() {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file: {}", path.display()))?;
        let cfg: FileConfig = toml::from_str(&text).context("parsing config TOML")?;
        Ok(Some(cfg))
    } else {
        Ok(None)
    }
}

/// Azure deployment names: alphanumerics with single `_`/`-` separators.
pub fn validate_azure_deployment_name(name: &str) -> Result<()> {
    let re = Regex::new(r"^[a-zA-Z0-9]+([_-]?[a-zA-Z0-9]+)*$")?;
    if !re.is_match(name) {
        bail!(
            "invalid azure deployment name '{}': azure openai deployment can only include alphanumeric characters, '_,-', and can't end with '_' or '-'",
            name
        );
    }
    Ok(())
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl AppConfig {
    /// Merge CLI/env values over the optional config file and validate.
    pub fn resolve(cli: Overrides, file: Option<FileConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();

        let api_key = non_empty(cli.api_key).or(non_empty(file.api_key));
        let Some(api_key) = api_key else {
            bail!("missing OPENAI_API_KEY: provide --openai-api-key or set OPENAI_API_KEY");
        };

        let deployment_name = non_empty(cli.deployment)
            .or(non_empty(file.deployment))
            .unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string());
        let deployment = Deployment::from_name(&deployment_name)?;

        let azure_endpoint = non_empty(cli.azure_endpoint).or(non_empty(file.azure_endpoint));
        if azure_endpoint.is_some() {
            validate_azure_deployment_name(&deployment_name)?;
        }

        let temperature = cli.temperature.or(file.temperature).unwrap_or(0.0);
        if !(0.0..=2.0).contains(&temperature) {
            bail!("invalid temperature {}: expected a value between 0 and 2", temperature);
        }

        let max_tokens = cli.max_tokens.or(file.max_tokens).filter(|m| *m > 0);

        Ok(Self {
            api_key,
            deployment,
            max_tokens,
            azure_endpoint,
            skip_confirmation: cli.skip_confirmation.or(file.skip_confirmation).unwrap_or(false),
            temperature,
            chat_context: cli.chat_context.or(file.chat_context).unwrap_or_default(),
            api_base: non_empty(cli.api_base)
                .or(non_empty(file.api_base))
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            timeout_secs: cli.timeout_secs.or(file.timeout_secs).unwrap_or(DEFAULT_TIMEOUT_SECS),
            choices: CHOICES,
        })
    }

    pub fn is_azure(&self) -> bool {
        self.azure_endpoint.is_some()
    }
}
