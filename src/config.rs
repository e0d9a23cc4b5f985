use crate::compound::Compound;
use crate::error::{Result, StrategyError};
use crate::strategy::{NamedPlan, StrategyPlan};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    RandomForest,
    /// Ordinary least squares on the same two features; a baseline.
    Linear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub estimator: EstimatorKind,
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
    pub test_ratio: f64,
    pub min_rows: usize,
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(StrategyError::invalid_config(
                "model.test_ratio",
                format!("must be in (0, 1), got {}", self.test_ratio),
            ));
        }
        if self.n_trees == 0 {
            return Err(StrategyError::invalid_config("model.n_trees", "must be at least 1"));
        }
        Ok(())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorKind::RandomForest,
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
            test_ratio: 0.2,
            min_rows: 10,
        }
    }
}

/// Tyre wear in percent of tyre life per lap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WearRates {
    pub soft: f64,
    pub medium: f64,
    pub hard: f64,
}

impl Default for WearRates {
    fn default() -> Self {
        Self { soft: 1.8, medium: 1.2, hard: 0.8 }
    }
}

impl WearRates {
    pub fn validate(&self) -> Result<()> {
        for compound in Compound::ALL {
            let rate = self.rate(compound);
            if !(rate.is_finite() && rate >= 0.0) {
                return Err(StrategyError::invalid_config(
                    "simulation.wear",
                    format!("{compound} wear must be a non-negative number, got {rate}"),
                ));
            }
        }
        Ok(())
    }

    pub fn rate(&self, compound: Compound) -> f64 {
        match compound {
            Compound::Soft => self.soft,
            Compound::Medium => self.medium,
            Compound::Hard => self.hard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub race_laps: u32,
    /// Seconds added to the lap on which the car pits.
    pub pit_loss: f64,
    pub fresh_tyre_life: f64,
    pub wear: WearRates,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.race_laps == 0 {
            return Err(StrategyError::invalid_config("simulation.race_laps", "must be at least 1"));
        }
        if !(self.pit_loss.is_finite() && self.pit_loss >= 0.0) {
            return Err(StrategyError::invalid_config(
                "simulation.pit_loss",
                format!("must be a non-negative number of seconds, got {}", self.pit_loss),
            ));
        }
        if !(self.fresh_tyre_life > 0.0 && self.fresh_tyre_life <= 100.0) {
            return Err(StrategyError::invalid_config(
                "simulation.fresh_tyre_life",
                format!("must be in (0, 100], got {}", self.fresh_tyre_life),
            ));
        }
        self.wear.validate()
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            race_laps: 70,
            pit_loss: 22.0,
            fresh_tyre_life: 100.0,
            wear: WearRates::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    pub seconds_per_position: f64,
}

impl ComparisonConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.seconds_per_position.is_finite() && self.seconds_per_position > 0.0) {
            return Err(StrategyError::invalid_config(
                "comparison.seconds_per_position",
                format!("must be positive, got {}", self.seconds_per_position),
            ));
        }
        Ok(())
    }
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self { seconds_per_position: 5.0 }
    }
}

/// Where historical laps come from. Raw telemetry is never cached by this
/// crate; whoever exports the CSV owns that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub laps_csv: PathBuf,
    pub season: Option<u16>,
    pub event: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            laps_csv: PathBuf::from("laps.csv"),
            season: Some(2023),
            event: Some("British Grand Prix".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub telemetry: TelemetryConfig,
    pub model: ModelConfig,
    pub simulation: SimulationConfig,
    pub comparison: ComparisonConfig,
    pub plans: Vec<NamedPlan>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telemetry: TelemetryConfig::default(),
            model: ModelConfig::default(),
            simulation: SimulationConfig::default(),
            comparison: ComparisonConfig::default(),
            plans: vec![
                NamedPlan::new("Plan A", StrategyPlan::new(Compound::Soft, 25)),
                NamedPlan::new("Plan B", StrategyPlan::new(Compound::Medium, 40)),
            ],
        }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Parses and validates; a config that would make the simulator or
    /// comparator produce nonsense is rejected here.
    pub fn from_json(data: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        self.simulation.validate()?;
        self.comparison.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.simulation.race_laps, 70);
        assert_eq!(config.simulation.pit_loss, 22.0);
        assert_eq!(config.comparison.seconds_per_position, 5.0);
        assert_eq!(config.model.min_rows, 10);
    }

    #[test]
    fn partial_override() {
        let config = AppConfig::from_json(
            r#"{
                "model": { "estimator": "linear", "n_trees": 10 },
                "simulation": { "pit_loss": 19.5, "wear": { "soft": 2.5 } },
                "plans": [ { "name": "one stop", "tyre": "HARD", "pit_lap": 30 } ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.model.estimator, EstimatorKind::Linear);
        assert_eq!(config.model.n_trees, 10);
        assert_eq!(config.model.seed, 42);
        assert_eq!(config.simulation.pit_loss, 19.5);
        assert_eq!(config.simulation.wear.rate(Compound::Soft), 2.5);
        assert_eq!(config.simulation.wear.rate(Compound::Medium), 1.2);
        assert_eq!(config.plans.len(), 1);
        assert_eq!(config.plans[0].plan, StrategyPlan::new(Compound::Hard, 30));
    }

    #[test]
    fn unknown_plan_tyre_is_rejected() {
        let err = AppConfig::from_json(r#"{ "plans": [ { "name": "x", "tyre": "Wet", "pit_lap": 3 } ] }"#);
        assert!(err.is_err());
    }

    fn rejected_field(json: &str) -> &'static str {
        match AppConfig::from_json(json) {
            Err(StrategyError::InvalidConfig { field, .. }) => field,
            other => panic!("expected InvalidConfig for {json}, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let cases = [
            (r#"{ "simulation": { "wear": { "medium": -0.5 } } }"#, "simulation.wear"),
            (r#"{ "simulation": { "fresh_tyre_life": 0.0 } }"#, "simulation.fresh_tyre_life"),
            (r#"{ "simulation": { "fresh_tyre_life": 120.0 } }"#, "simulation.fresh_tyre_life"),
            (r#"{ "simulation": { "race_laps": 0 } }"#, "simulation.race_laps"),
            (r#"{ "simulation": { "pit_loss": -1.0 } }"#, "simulation.pit_loss"),
            (r#"{ "comparison": { "seconds_per_position": 0.0 } }"#, "comparison.seconds_per_position"),
            (r#"{ "comparison": { "seconds_per_position": -5.0 } }"#, "comparison.seconds_per_position"),
            (r#"{ "model": { "test_ratio": 0.0 } }"#, "model.test_ratio"),
            (r#"{ "model": { "test_ratio": 1.0 } }"#, "model.test_ratio"),
            (r#"{ "model": { "test_ratio": 1.5 } }"#, "model.test_ratio"),
            (r#"{ "model": { "n_trees": 0 } }"#, "model.n_trees"),
        ];
        for (json, field) in cases {
            assert_eq!(rejected_field(json), field, "{json}");
        }
    }

    #[test]
    fn boundary_values_are_accepted() {
        let config = AppConfig::from_json(
            r#"{
                "model": { "test_ratio": 0.5 },
                "simulation": { "race_laps": 1, "pit_loss": 0.0, "fresh_tyre_life": 100.0,
                                "wear": { "soft": 0.0, "medium": 0.0, "hard": 0.0 } },
                "comparison": { "seconds_per_position": 0.1 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.simulation.race_laps, 1);
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn load_validates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{ "simulation": { "race_laps": 0 } }"#).unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, StrategyError::InvalidConfig { field: "simulation.race_laps", .. }));
    }

    #[test]
    fn wear_rates_reference_values() {
        let wear = WearRates::default();
        assert_eq!(wear.rate(Compound::Soft), 1.8);
        assert_eq!(wear.rate(Compound::Medium), 1.2);
        assert_eq!(wear.rate(Compound::Hard), 0.8);
    }
}
