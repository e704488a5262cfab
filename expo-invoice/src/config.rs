use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compose::{ComposeOptions, FontSource, DEFAULT_TITLE};
use crate::error::{InvoiceError, Result};
use crate::format::{BookingFormat, PriceFormat};
use crate::grouping::BillingRules;
use crate::output::OutputMode;

/// Run configuration, usually read from a TOML file. Every section and
/// key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub document: DocumentConfig,
    pub billing: BillingConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentConfig {
    /// Banner printed at the top of every page.
    pub title: String,
    /// Directory holding the DejaVu Sans faces. Builtin Helvetica is
    /// used when unset.
    pub font_dir: Option<PathBuf>,
    pub compress: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        DocumentConfig {
            title: DEFAULT_TITLE.to_string(),
            font_dir: None,
            compress: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BillingConfig {
    pub accepted_payment_method: String,
    pub currency_suffix: String,
    pub booking_prefix: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        BillingConfig {
            accepted_payment_method: BillingRules::default().accepted_payment_method,
            currency_suffix: PriceFormat::default().suffix,
            booking_prefix: BookingFormat::default().prefix,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Field separator of delimited text. One ASCII character.
    pub csv_delimiter: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            csv_delimiter: ",".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub mode: OutputMode,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: PathBuf::from("."),
            mode: OutputMode::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.delimiter()?;
        Ok(config)
    }

    pub fn delimiter(&self) -> Result<u8> {
        match self.input.csv_delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(InvoiceError::format(
                "input.csv_delimiter",
                self.input.csv_delimiter.as_str(),
                "expected a single ASCII character",
            )),
        }
    }

    pub fn billing_rules(&self) -> BillingRules {
        BillingRules {
            accepted_payment_method: self.billing.accepted_payment_method.clone(),
        }
    }

    pub fn compose_options(&self) -> ComposeOptions {
        ComposeOptions {
            title: self.document.title.clone(),
            fonts: match &self.document.font_dir {
                Some(dir) => FontSource::TrueType { dir: dir.clone() },
                None => FontSource::Builtin,
            },
            rules: self.billing_rules(),
            price: PriceFormat {
                suffix: self.billing.currency_suffix.clone(),
            },
            booking: BookingFormat {
                prefix: self.billing.booking_prefix.clone(),
            },
            compress: self.document.compress,
        }
    }
}
