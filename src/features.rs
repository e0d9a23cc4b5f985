use crate::compound::Compound;
use crate::data::HistoricalLap;
use crate::error::{Result, StrategyError};
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Number of feature columns: lap number and compound code.
pub const N_FEATURES: usize = 2;

/// One usable training row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow {
    pub lap_number: u32,
    pub compound: Compound,
    pub lap_time_secs: f64,
}

impl FeatureRow {
    pub fn features(&self) -> [f64; N_FEATURES] {
        encode(self.lap_number, self.compound)
    }
}

/// The model input for a lap; shared by training and prediction.
pub fn encode(lap_number: u32, compound: Compound) -> [f64; N_FEATURES] {
    [lap_number as f64, compound.code() as f64]
}

impl TryFrom<&HistoricalLap> for FeatureRow {
    type Error = StrategyError;

    fn try_from(lap: &HistoricalLap) -> Result<Self> {
        let lap_number = lap
            .lap_number
            .filter(|n| *n >= 1)
            .ok_or_else(|| StrategyError::malformed("missing lap number"))?;
        let lap_time_secs = lap
            .lap_time
            .map(|t| t.as_secs_f64())
            .filter(|s| s.is_finite() && *s > 0.0)
            .ok_or_else(|| StrategyError::malformed("missing lap time"))?;
        let compound = lap
            .compound
            .as_deref()
            .ok_or_else(|| StrategyError::malformed("missing compound"))?
            .parse::<Compound>()?;

        Ok(Self { lap_number, compound, lap_time_secs })
    }
}

/// Feature matrix (`[lap, compound code]` per row) with its lap-time targets in seconds.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub features: Array2<f64>,
    pub targets: Array1<f64>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Turns raw laps into a regression table, dropping rows that lack a lap
/// number, a positive lap time or a known compound.
pub fn prepare(raw_laps: &[HistoricalLap]) -> Result<FeatureTable> {
    let mut dropped: BTreeMap<String, usize> = BTreeMap::new();
    let rows: Vec<FeatureRow> = raw_laps
        .iter()
        .filter_map(|lap| match FeatureRow::try_from(lap) {
            Ok(row) => Some(row),
            Err(err) => {
                let reason = match err {
                    StrategyError::InvalidCompound { .. } => "unknown compound".to_string(),
                    StrategyError::MalformedLapRecord { reason } => reason,
                    other => other.to_string(),
                };
                *dropped.entry(reason).or_default() += 1;
                None
            }
        })
        .collect();

    if rows.is_empty() && !raw_laps.is_empty() {
        warn!(total = raw_laps.len(), ?dropped, "every lap was unusable");
    } else if !dropped.is_empty() {
        debug!(kept = rows.len(), ?dropped, "dropped unusable laps");
    }

    let feats: Vec<f64> = rows.iter().flat_map(|r| r.features()).collect();
    let targets: Vec<f64> = rows.iter().map(|r| r.lap_time_secs).collect();

    Ok(FeatureTable {
        features: Array2::from_shape_vec((rows.len(), N_FEATURES), feats)?,
        targets: Array1::from_vec(targets),
    })
}
