//! Command implementations for infinityctl

pub mod demo;
pub mod device;
pub mod led;
pub mod udev;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use infinity_base::udev::UDEV_RULE_PATH;
use infinity_base::{BaseConfig, InfinityBase};
use infinity_hid_common::{HidApiPort, HidPort};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LedMode {
    /// Switch the LED to the color immediately
    Set,
    /// Fade from the current color
    Fade,
    /// Flash the color a few times
    Flash,
}

impl LedMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Fade => "fade",
            Self::Flash => "flash",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Set => "Set",
            Self::Fade => "Faded",
            Self::Flash => "Flashed",
        }
    }
}

#[derive(Debug, Args)]
pub struct ColorArgs {
    /// Platform number (1 hexagon, 2 player 1, 3 player 2)
    pub platform: u8,
    /// Red component
    pub red: u8,
    /// Green component
    pub green: u8,
    /// Blue component
    pub blue: u8,
    /// How the color is applied
    #[arg(long, value_enum, default_value_t = LedMode::Set)]
    pub mode: LedMode,
}

#[derive(Debug, Args)]
pub struct UdevArgs {
    /// Write the rule file (needs root for the default location)
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = UDEV_RULE_PATH
    )]
    pub write: Option<PathBuf>,
    /// Check the permissions of the hidraw node of every connected base
    #[arg(long)]
    pub check: bool,
}

/// Flag values that take precedence over the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
    pub path: Option<String>,
}

/// Load the config file if one was given, then apply flag overrides.
pub fn resolve_config(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<BaseConfig> {
    let mut config = match file {
        Some(path) => BaseConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => BaseConfig::default(),
    };

    if let Some(vendor_id) = overrides.vendor_id {
        config.vendor_id = vendor_id;
    }
    if let Some(product_id) = overrides.product_id {
        config.product_id = product_id;
    }
    if let Some(path) = &overrides.path {
        config.path = Some(path.clone());
    }
    config.validate()?;
    Ok(config)
}

pub fn open_port() -> Result<Arc<dyn HidPort>> {
    let port = HidApiPort::new().context("Failed to initialise the HID library")?;
    Ok(Arc::new(port))
}

/// Open, start and activate the configured base.
pub fn connect(config: &BaseConfig, port: Arc<dyn HidPort>) -> Result<InfinityBase> {
    let mut base = InfinityBase::with_port(config.clone(), port);
    base.connect()?;
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn given_no_file_when_resolving_then_defaults() -> TestResult {
        let config = resolve_config(None, &ConfigOverrides::default())?;
        assert_eq!(config, BaseConfig::default());
        Ok(())
    }

    #[test]
    fn given_file_and_flags_when_resolving_then_flags_win() -> TestResult {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile()?;
        writeln!(file, "product_id: 0x0241\npath: /dev/hidraw1\nreply_timeout_ms: 900")?;

        let overrides = ConfigOverrides {
            vendor_id: Some(0x1234),
            path: Some("/dev/hidraw5".to_string()),
            ..ConfigOverrides::default()
        };
        let config = resolve_config(Some(file.path()), &overrides)?;

        assert_eq!(config.vendor_id, 0x1234);
        assert_eq!(config.product_id, 0x0241);
        assert_eq!(config.path.as_deref(), Some("/dev/hidraw5"));
        assert_eq!(config.reply_timeout_ms, 900);
        Ok(())
    }

    #[test]
    fn given_empty_path_flag_when_resolving_then_config_error() {
        let overrides = ConfigOverrides {
            path: Some(String::new()),
            ..ConfigOverrides::default()
        };
        let err = resolve_config(None, &overrides).err();
        assert!(
            err.as_ref()
                .and_then(|e| e.downcast_ref::<infinity_base::ConfigError>())
                .is_some()
        );
    }

    #[test]
    fn given_led_modes_when_named_then_lowercase() {
        assert_eq!(LedMode::Set.as_str(), "set");
        assert_eq!(LedMode::Fade.as_str(), "fade");
        assert_eq!(LedMode::Flash.past_tense(), "Flashed");
    }
}
