mod layout;

pub use layout::{HeaderField, ItemColumn, ResolvedLayout, TemplateLayout};

use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub storage: StorageConfig,
    pub ledger: LedgerConfig,
    pub layout: TemplateLayout,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Workbook acting as the invoice database.
    pub ledger_path: PathBuf,
    /// Invoice template filled for every submission.
    pub template_path: PathBuf,
    /// Where `Invoice_<number>.xlsx` files are written.
    pub output_dir: PathBuf,
    /// Form page and script.
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Appends waiting for the ledger writer before callers are held back.
    pub queue_capacity: usize,
}

impl BillingConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let layout = match env::var("TEMPLATE_LAYOUT_PATH") {
            Ok(path) => TemplateLayout::load(&path)?,
            Err(_) => TemplateLayout::default(),
        };

        Ok(BillingConfig {
            common: common_config,
            storage: StorageConfig {
                ledger_path: get_env("LEDGER_PATH", Some("invoices_db.xlsx"), is_prod)?.into(),
                template_path: get_env("TEMPLATE_PATH", Some("1stop.xlsx"), is_prod)?.into(),
                output_dir: get_env("OUTPUT_DIR", Some("."), is_prod)?.into(),
                static_dir: get_env("STATIC_DIR", Some("static"), is_prod)?.into(),
            },
            ledger: LedgerConfig {
                queue_capacity: get_env("LEDGER_QUEUE_CAPACITY", Some("64"), false)?
                    .parse()
                    .map_err(|e| {
                        AppError::ConfigError(anyhow::anyhow!(
                            "LEDGER_QUEUE_CAPACITY must be a positive integer: {}",
                            e
                        ))
                    })?,
            },
            layout,
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}
