//! Engine configuration (TOML)
//!
//! Example:
//! ```toml
//! [voting]
//! epoch_duration_secs = 604800
//! max_user_weight = 100
//!
//! [governance]
//! veto_threshold_bps = 1000
//! slash_bps = 5000
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::{Amount, BPS_SCALE, DAY_SECS, MAX_TOTAL_ALLOCATION, UNIT, WEEK_SECS, WEIGHT_SCALE};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Gauge voting engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingConfig {
    /// Length of one settlement epoch
    pub epoch_duration_secs: u64,

    /// Finalized weight (of WEIGHT_SCALE) a gauge needs to be flagged as
    /// meeting the emissions minimum
    pub min_gauge_weight: u64,

    /// Largest percentage a voter may put on a single gauge
    pub max_user_weight: u32,

    /// Wait between a bribe deposit and the first claim
    pub bribe_claim_delay_secs: u64,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            epoch_duration_secs: WEEK_SECS,
            min_gauge_weight: WEIGHT_SCALE / 100,
            max_user_weight: MAX_TOTAL_ALLOCATION,
            bribe_claim_delay_secs: DAY_SECS,
        }
    }
}

/// Permissionless gauge governance settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    pub min_deposit: Amount,
    pub voting_period_secs: u64,

    /// Veto share of total supply that kills a proposal
    pub veto_threshold_bps: u32,

    /// Support share of votes cast needed to pass
    pub support_threshold_bps: u32,

    /// Share of total supply that must take part
    pub min_participation_bps: u32,

    pub proposer_cooldown_secs: u64,

    /// Portion of the deposit forfeited on veto
    pub slash_bps: u32,

    pub activation_delay_secs: u64,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            min_deposit: 1_000 * UNIT,
            voting_period_secs: 3 * DAY_SECS,
            veto_threshold_bps: 1_000,
            support_threshold_bps: 5_000,
            min_participation_bps: 100,
            proposer_cooldown_secs: WEEK_SECS,
            slash_bps: 5_000,
            activation_delay_secs: DAY_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Buffered notifications per subscriber before the oldest are dropped
    pub channel_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1_024,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub voting: VotingConfig,
    pub governance: GovernanceConfig,
    pub events: EventConfig,
}

impl EngineConfig {
    /// Load and validate configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let mut content = String::new();
        content.push_str("# Gauge emissions engine configuration\n");
        content.push_str("# Fractions are basis points (10000 = 100%), amounts are 1e9-scaled units\n\n");
        content.push_str(&self.to_toml_string()?);
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let voting = &self.voting;
        let governance = &self.governance;

        if voting.epoch_duration_secs == 0 {
            return Err(invalid("voting.epoch_duration_secs", "must be positive"));
        }
        if voting.min_gauge_weight > WEIGHT_SCALE {
            return Err(invalid(
                "voting.min_gauge_weight",
                format!("must not exceed {}", WEIGHT_SCALE),
            ));
        }
        if voting.max_user_weight == 0 || voting.max_user_weight > MAX_TOTAL_ALLOCATION {
            return Err(invalid(
                "voting.max_user_weight",
                format!("must be within 1..={}", MAX_TOTAL_ALLOCATION),
            ));
        }
        if governance.voting_period_secs == 0 {
            return Err(invalid("governance.voting_period_secs", "must be positive"));
        }

        for (key, bps) in [
            ("governance.veto_threshold_bps", governance.veto_threshold_bps),
            ("governance.support_threshold_bps", governance.support_threshold_bps),
            ("governance.min_participation_bps", governance.min_participation_bps),
            ("governance.slash_bps", governance.slash_bps),
        ] {
            if bps > BPS_SCALE {
                return Err(invalid(key, format!("{} exceeds {}", bps, BPS_SCALE)));
            }
        }

        if self.events.channel_capacity == 0 {
            return Err(invalid("events.channel_capacity", "must be positive"));
        }

        Ok(())
    }
}

fn invalid(key: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        message: message.into(),
    }
}
