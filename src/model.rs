use crate::compound::Compound;
use crate::config::{EstimatorKind, ModelConfig};
use crate::data::HistoricalLap;
use crate::error::{Result, StrategyError};
use crate::features::{encode, prepare};
use crate::forest::{RandomForest, RandomForestParams};
use crate::strategy::LapTimePredictor;
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{arr2, Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

pub type FittedLinearRegression = linfa_linear::FittedLinearRegression<f64>;

#[derive(Debug, Clone)]
pub enum Estimator {
    Forest(RandomForest),
    Linear(FittedLinearRegression),
}

impl Estimator {
    fn predict_batch(&self, x: &Array2<f64>) -> Array1<f64> {
        match self {
            Estimator::Forest(forest) => forest.predict(x),
            Estimator::Linear(linear) => linear.predict(x),
        }
    }
}

/// Fitted lap-time regressor together with its hold-out accuracy.
#[derive(Debug, Clone)]
pub struct LapTimeModel {
    estimator: Estimator,
    mae: f64,
    train_rows: usize,
    test_rows: usize,
}

impl LapTimeModel {
    /// Mean absolute error on the held-out rows, in seconds.
    pub fn mae(&self) -> f64 {
        self.mae
    }

    pub fn train_rows(&self) -> usize {
        self.train_rows
    }

    pub fn test_rows(&self) -> usize {
        self.test_rows
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    /// Predicted lap time in seconds, never negative.
    pub fn predict(&self, lap_number: u32, compound: Compound) -> f64 {
        let x = arr2(&[encode(lap_number, compound)]);
        self.estimator.predict_batch(&x)[0].max(0.0)
    }

    /// Same as [`predict`](Self::predict) for a compound given by name.
    pub fn predict_named(&self, lap_number: u32, compound: &str) -> Result<f64> {
        Ok(self.predict(lap_number, compound.parse()?))
    }
}

impl LapTimePredictor for LapTimeModel {
    fn predict_lap(&self, lap_number: u32, compound: Compound) -> Result<f64> {
        Ok(self.predict(lap_number, compound))
    }
}

/// Fits a lap-time model on the usable laps and scores it on a seeded
/// hold-out split.
pub fn train(raw_laps: &[HistoricalLap], config: &ModelConfig) -> Result<LapTimeModel> {
    let table = prepare(raw_laps)?;
    let required = config.min_rows.max(2);
    if table.len() < required {
        return Err(StrategyError::InsufficientData { found: table.len(), required });
    }

    let (train_idx, test_idx) = split_indices(table.len(), config.test_ratio, config.seed);
    let x_train = table.features.select(Axis(0), &train_idx);
    let y_train = table.targets.select(Axis(0), &train_idx);
    let x_test = table.features.select(Axis(0), &test_idx);
    let y_test = table.targets.select(Axis(0), &test_idx);

    let ds = Dataset::new(x_train, y_train);
    let estimator = match config.estimator {
        EstimatorKind::RandomForest => Estimator::Forest(
            RandomForestParams::new()
                .n_trees(config.n_trees)
                .max_depth(config.max_depth)
                .min_samples_split(config.min_samples_split)
                .min_samples_leaf(config.min_samples_leaf)
                .seed(config.seed)
                .fit(&ds)?,
        ),
        EstimatorKind::Linear => Estimator::Linear(LinearRegression::new().fit(&ds)?),
    };

    let preds = estimator.predict_batch(&x_test).mapv(|p| p.max(0.0));
    let mae = (&preds - &y_test).mapv(f64::abs).mean().unwrap_or(0.0);

    info!(
        estimator = ?config.estimator,
        rows = table.len(),
        train = train_idx.len(),
        test = test_idx.len(),
        mae,
        "trained lap-time model"
    );

    Ok(LapTimeModel {
        estimator,
        mae,
        train_rows: train_idx.len(),
        test_rows: test_idx.len(),
    })
}

/// Name-based prediction for callers holding user input.
pub fn predict(model: &LapTimeModel, lap_number: u32, compound: &str) -> Result<f64> {
    model.predict_named(lap_number, compound)
}

// (train, test); the test side gets ceil(n * ratio) rows, and neither side is empty
fn split_indices(n: usize, test_ratio: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut idx: Vec<usize> = (0..n).collect();
    idx.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));

    let ratio = if test_ratio.is_finite() { test_ratio.clamp(0.0, 1.0) } else { 0.2 };
    let n_test = ((n as f64 * ratio).ceil() as usize).clamp(1, n - 1);
    let train = idx.split_off(n_test);
    (train, idx)
}
