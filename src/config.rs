//! Analysis configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunable parameters of an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    /// Annual risk-free rate as a fraction.
    pub risk_free_rate: f64,
    /// Minimum episode magnitude, in percent.
    pub drawdown_threshold_pct: f64,
    /// Decline from peak, in percent, that starts episode tracking.
    pub decline_trigger_pct: f64,
    /// Rolling volatility look-back windows, in trading days.
    pub volatility_windows: Vec<usize>,
    /// Annualization factor.
    pub trading_days_per_year: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.025,
            drawdown_threshold_pct: 20.0,
            decline_trigger_pct: 5.0,
            volatility_windows: vec![30, 60, 252],
            trading_days_per_year: 252.0,
        }
    }
}

impl AnalysisConfig {
    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `RAVA_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RAVA_RISK_FREE_RATE") {
            self.risk_free_rate = parse_f64("risk_free_rate", &v)?;
        }
        if let Some(v) = lookup("RAVA_DRAWDOWN_THRESHOLD") {
            self.drawdown_threshold_pct = parse_f64("drawdown_threshold_pct", &v)?;
        }
        if let Some(v) = lookup("RAVA_DECLINE_TRIGGER") {
            self.decline_trigger_pct = parse_f64("decline_trigger_pct", &v)?;
        }
        if let Some(v) = lookup("RAVA_VOL_WINDOWS") {
            self.volatility_windows = v
                .split(',')
                .map(|s| {
                    s.trim().parse::<usize>().map_err(|e| ConfigError::Invalid {
                        field: "volatility_windows",
                        reason: format!("'{}': {}", s.trim(), e),
                    })
                })
                .collect::<Result<_, _>>()?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.risk_free_rate.is_finite() || self.risk_free_rate < 0.0 {
            return Err(invalid("risk_free_rate", "must be a finite non-negative fraction"));
        }
        for (field, value) in [
            ("drawdown_threshold_pct", self.drawdown_threshold_pct),
            ("decline_trigger_pct", self.decline_trigger_pct),
        ] {
            if !(value > 0.0 && value < 100.0) {
                return Err(invalid(field, "must lie strictly between 0 and 100"));
            }
        }
        if self.volatility_windows.is_empty() {
            return Err(invalid("volatility_windows", "at least one window is required"));
        }
        if self.volatility_windows.iter().any(|&w| w < 2) {
            return Err(invalid("volatility_windows", "windows need at least two observations"));
        }
        if !(self.trading_days_per_year > 0.0) {
            return Err(invalid("trading_days_per_year", "must be positive"));
        }
        Ok(())
    }

    /// The longest configured volatility window
    pub fn largest_window(&self) -> usize {
        self.volatility_windows.iter().copied().max().unwrap_or(0)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

fn parse_f64(field: &'static str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|e| ConfigError::Invalid {
        field,
        reason: format!("'{}': {}", value.trim(), e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.risk_free_rate, 0.025);
        assert_eq!(config.drawdown_threshold_pct, 20.0);
        assert_eq!(config.decline_trigger_pct, 5.0);
        assert_eq!(config.volatility_windows, vec![30, 60, 252]);
        assert_eq!(config.largest_window(), 252);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnalysisConfig = serde_json::from_str(r#"{"riskFreeRate":0.04}"#).unwrap();
        assert_eq!(config.risk_free_rate, 0.04);
        assert_eq!(config.volatility_windows, vec![30, 60, 252]);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("RAVA_RISK_FREE_RATE", "0.01"),
            ("RAVA_VOL_WINDOWS", "10, 20"),
        ]
        .into_iter()
        .collect();

        let config = AnalysisConfig::default()
            .with_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.risk_free_rate, 0.01);
        assert_eq!(config.volatility_windows, vec![10, 20]);
        assert_eq!(config.drawdown_threshold_pct, 20.0);
    }

    #[test]
    fn test_bad_override_rejected() {
        let result = AnalysisConfig::default().with_overrides(|k| {
            (k == "RAVA_VOL_WINDOWS").then(|| "30,abc".to_string())
        });
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { field: "volatility_windows", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AnalysisConfig::default();
        config.drawdown_threshold_pct = 0.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.volatility_windows = vec![30, 0];
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.risk_free_rate = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rava.json");
        std::fs::write(&path, r#"{"drawdownThresholdPct": 15.0}"#).unwrap();

        let config = AnalysisConfig::from_file(&path).unwrap();
        assert_eq!(config.drawdown_threshold_pct, 15.0);

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(AnalysisConfig::from_file(&path), Err(ConfigError::Parse(_))));
    }
}
