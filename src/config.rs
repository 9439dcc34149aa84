//! Run configuration, loaded from TOML.
//!
//! Every section is optional; missing values fall back to the `standard`
//! profile.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::imagery::ImageryConfig;
use crate::multidigit::{MultiDigitConfig, VerdictPolicy};
use crate::side::{RelinkPolicy, SideConfig, SideThresholds};

/// Named parameter sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// 0.3/0.7 side split, exception-aware delete verdicts
    #[default]
    Standard,
    /// 0.01/0.99 side split, delete only on long segments
    Strict,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub side: SideConfig,
    pub multidigit: MultiDigitConfig,
    pub imagery: ImageryConfig,
}

impl Config {
    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Standard => Self::default(),
            Profile::Strict => Self {
                side: SideConfig {
                    thresholds: SideThresholds::STRICT,
                    relink_policy: RelinkPolicy::AmbiguousOk,
                    ..SideConfig::default()
                },
                multidigit: MultiDigitConfig {
                    verdict_policy: VerdictPolicy::LongSegment,
                    ..MultiDigitConfig::default()
                },
                imagery: ImageryConfig::default(),
            },
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let t = self.side.thresholds;
        if !(0.0..=1.0).contains(&t.low) || !(0.0..=1.0).contains(&t.high) || t.low > t.high {
            return Err(Error::Config(format!(
                "side thresholds must satisfy 0 <= low <= high <= 1, got ({}, {})",
                t.low, t.high
            )));
        }
        if self.multidigit.buffer_radius < 0.0 {
            return Err(Error::Config("buffer_radius must not be negative".into()));
        }
        Ok(())
    }
}
