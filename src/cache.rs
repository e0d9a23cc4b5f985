use crate::config::{EstimatorKind, ModelConfig};
use crate::data::HistoricalLap;
use crate::error::Result;
use crate::model::{train, LapTimeModel};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

/// Identity of a training run: every lap field plus the model settings.
pub fn fingerprint(laps: &[HistoricalLap], config: &ModelConfig) -> u64 {
    let mut hasher = DefaultHasher::new();

    laps.len().hash(&mut hasher);
    for lap in laps {
        lap.lap_number.hash(&mut hasher);
        lap.compound.hash(&mut hasher);
        lap.lap_time.hash(&mut hasher);
    }

    match config.estimator {
        EstimatorKind::RandomForest => 0u8.hash(&mut hasher),
        EstimatorKind::Linear => 1u8.hash(&mut hasher),
    }
    config.n_trees.hash(&mut hasher);
    config.max_depth.hash(&mut hasher);
    config.min_samples_split.hash(&mut hasher);
    config.min_samples_leaf.hash(&mut hasher);
    config.seed.hash(&mut hasher);
    config.test_ratio.to_bits().hash(&mut hasher);
    config.min_rows.hash(&mut hasher);

    hasher.finish()
}

/// Trained models keyed by [`fingerprint`], so repeated what-if runs over the
/// same race reuse one fit. Nothing is evicted; call [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct ModelCache {
    models: HashMap<u64, Arc<LapTimeModel>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_train(
        &mut self,
        laps: &[HistoricalLap],
        config: &ModelConfig,
    ) -> Result<Arc<LapTimeModel>> {
        let key = fingerprint(laps, config);
        if let Some(model) = self.models.get(&key) {
            debug!(key, "model cache hit");
            return Ok(Arc::clone(model));
        }

        debug!(key, "model cache miss");
        let model = Arc::new(train(laps, config)?);
        self.models.insert(key, Arc::clone(&model));
        Ok(model)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn clear(&mut self) {
        self.models.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn laps(n: u32) -> Vec<HistoricalLap> {
        (1..=n)
            .map(|lap| HistoricalLap::new(lap, "MEDIUM", Duration::from_millis(91_000 + 40 * lap as u64)))
            .collect()
    }

    fn config() -> ModelConfig {
        ModelConfig { n_trees: 5, ..ModelConfig::default() }
    }

    #[test]
    fn same_data_hits_cache() {
        let mut cache = ModelCache::new();
        let a = cache.get_or_train(&laps(30), &config()).unwrap();
        let b = cache.get_or_train(&laps(30), &config()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn different_data_or_config_trains_again() {
        let mut cache = ModelCache::new();
        cache.get_or_train(&laps(30), &config()).unwrap();
        cache.get_or_train(&laps(31), &config()).unwrap();
        cache
            .get_or_train(&laps(30), &ModelConfig { seed: 7, ..config() })
            .unwrap();
        assert_eq!(cache.len(), 3);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn failed_training_is_not_cached() {
        let mut cache = ModelCache::new();
        assert!(cache.get_or_train(&laps(3), &config()).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn fingerprint_is_stable() {
        assert_eq!(fingerprint(&laps(20), &config()), fingerprint(&laps(20), &config()));
        assert_ne!(fingerprint(&laps(20), &config()), fingerprint(&laps(21), &config()));
    }
}
