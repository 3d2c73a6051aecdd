use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::backtest::position::DEFAULT_NOTIONAL;
use crate::estimator::KalmanConfig;
use crate::screening::DEFAULT_P_VALUE_CUTOFF;
use crate::strategy::residual_band::{
    AGGRESSIVE_THRESHOLD_MULTIPLIER, DEFAULT_THRESHOLD_MULTIPLIER,
};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub position: PositionConfig,
    #[serde(default)]
    pub screening: ScreeningConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    pub delta: f64,
    pub observation_var: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let k = KalmanConfig::default();
        Self {
            delta: k.delta,
            observation_var: k.observation_var,
        }
    }
}

impl FilterConfig {
    pub fn kalman(&self) -> KalmanConfig {
        KalmanConfig {
            delta: self.delta,
            observation_var: self.observation_var,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalProfile {
    #[default]
    Standard,
    Aggressive,
}

impl SignalProfile {
    pub fn threshold_multiplier(self) -> f64 {
        match self {
            Self::Standard => DEFAULT_THRESHOLD_MULTIPLIER,
            Self::Aggressive => AGGRESSIVE_THRESHOLD_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignalConfig {
    #[serde(default)]
    pub profile: SignalProfile,
    /// Explicit override; takes precedence over the profile.
    pub threshold_multiplier: Option<f64>,
}

impl SignalConfig {
    pub fn effective_multiplier(&self) -> f64 {
        self.threshold_multiplier
            .unwrap_or_else(|| self.profile.threshold_multiplier())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionConfig {
    pub notional: f64,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            notional: DEFAULT_NOTIONAL,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScreeningConfig {
    pub enabled: bool,
    pub p_value_cutoff: f64,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            p_value_cutoff: DEFAULT_P_VALUE_CUTOFF,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub db_path: PathBuf,
    /// Leg X shared by every pair in the run.
    pub reference_symbol: String,
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/reports")
}

impl DataConfig {
    /// Dependent legs, upper-cased, deduplicated, without the reference.
    pub fn pair_symbols(&self) -> Vec<String> {
        let reference = self.reference_symbol.trim().to_ascii_uppercase();
        let mut out: Vec<String> = Vec::new();
        for sym in &self.symbols {
            let s = sym.trim().to_ascii_uppercase();
            if !s.is_empty() && s != reference && !out.iter().any(|v| v == &s) {
                out.push(s);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from `KP_CONFIG_PATH` or `config/default.toml`.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let path = std::env::var("KP_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.filter
            .kalman()
            .validate()
            .context("filter section is invalid")?;

        let k = self.signal.effective_multiplier();
        if !k.is_finite() || k <= 0.0 {
            bail!("signal.threshold_multiplier must be > 0, got {}", k);
        }
        if !self.position.notional.is_finite() || self.position.notional <= 0.0 {
            bail!("position.notional must be > 0, got {}", self.position.notional);
        }
        let cutoff = self.screening.p_value_cutoff;
        if !(cutoff > 0.0 && cutoff <= 1.0) {
            bail!("screening.p_value_cutoff must be in (0, 1], got {}", cutoff);
        }
        if self.data.reference_symbol.trim().is_empty() {
            bail!("data.reference_symbol must not be empty");
        }
        Ok(())
    }
}
