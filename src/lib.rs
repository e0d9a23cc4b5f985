//! Lap-time prediction and pit-stop strategy comparison.
//!
//! A regression model is fitted once on one race's historical laps
//! ([`model::train`]); each [`StrategyPlan`] is then run through a fixed-length
//! race ([`strategy::simulate`]) and totals are turned into an estimated
//! position swing ([`compare::compare`]).
//!
//! ```no_run
//! use race_strategy::{compare, simulate, train, Compound, CsvTelemetrySource,
//!     ModelConfig, StrategyPlan, TelemetrySource};
//!
//! # fn main() -> race_strategy::Result<()> {
//! let laps = CsvTelemetrySource::new("laps.csv").load_laps()?;
//! let model = train(&laps, &ModelConfig::default())?;
//!
//! let a = simulate(&StrategyPlan::new(Compound::Soft, 25), &model)?;
//! let b = simulate(&StrategyPlan::new(Compound::Medium, 40), &model)?;
//! println!("{}", compare(a.total_time(), b.total_time()));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod compare;
pub mod compound;
pub mod config;
pub mod data;
mod error;
pub mod features;
pub mod forest;
pub mod model;
pub mod strategy;

pub use cache::ModelCache;
pub use compare::{compare, PositionChange, StrategyComparator};
pub use compound::Compound;
pub use config::{
    AppConfig, ComparisonConfig, EstimatorKind, ModelConfig, SimulationConfig, TelemetryConfig,
    WearRates,
};
pub use data::{CsvTelemetrySource, HistoricalLap, TelemetrySource};
pub use error::*;
pub use features::{prepare, FeatureRow, FeatureTable};
pub use model::{predict, train, LapTimeModel};
pub use strategy::{
    simulate, LapRecord, LapTimePredictor, NamedPlan, RaceTrace, StrategyPlan, StrategySimulator,
};
